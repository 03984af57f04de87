//! UI texts that are not authored in the CMS, per locale.

use crate::{collections::CollectionType, locale::Locale};


pub(crate) struct Texts {
    pub(crate) skip_to_content: &'static str,
    pub(crate) languages: &'static str,
    pub(crate) home: &'static str,
    pub(crate) read_more: &'static str,
    pub(crate) rss_feed: &'static str,
    pub(crate) loading: &'static str,
    pub(crate) not_found_title: &'static str,
    pub(crate) not_found_body: &'static str,
    pub(crate) error_title: &'static str,
    pub(crate) error_body: &'static str,
    pub(crate) back_home: &'static str,
    pub(crate) contents: &'static str,
    pub(crate) contact_us: &'static str,
    pub(crate) no_entries: &'static str,
    pub(crate) gallery_server_only: &'static str,
    pub(crate) version: &'static str,
    /// Navigation labels of the collections, in the order of
    /// `CollectionType::ALL`.
    pub(crate) collections: [&'static str; 5],

    pub(crate) submit: &'static str,
    pub(crate) sending: &'static str,
    pub(crate) email: &'static str,
    pub(crate) thank_you: &'static str,
    pub(crate) required_field: &'static str,

    pub(crate) upcoming: &'static str,
    pub(crate) live: &'static str,
    pub(crate) completed: &'static str,
    pub(crate) register: &'static str,
    pub(crate) close: &'static str,
    pub(crate) join_online: &'static str,
    pub(crate) location: &'static str,
    pub(crate) speakers: &'static str,
    pub(crate) hours: &'static str,
    pub(crate) no_events: &'static str,
    pub(crate) all_events: &'static str,
    pub(crate) layout: &'static str,
    pub(crate) layout_calendar: &'static str,
    pub(crate) layout_cards: &'static str,
    pub(crate) layout_list: &'static str,
    pub(crate) layout_timeline: &'static str,
    pub(crate) all_types: &'static str,
    pub(crate) show_upcoming: &'static str,
    pub(crate) show_past: &'static str,
    pub(crate) show_all: &'static str,
    pub(crate) webinar: &'static str,
    pub(crate) video: &'static str,
    pub(crate) physical: &'static str,
    pub(crate) hybrid: &'static str,
    pub(crate) previous_month: &'static str,
    pub(crate) next_month: &'static str,
    pub(crate) jump_to_next_event: &'static str,
    /// Weekday abbreviations, starting with Monday.
    pub(crate) weekdays: [&'static str; 7],
}

impl Texts {
    pub(crate) fn of(locale: &Locale) -> &'static Texts {
        match locale.code {
            "de" => &DE,
            "nb" => &NB,
            "ar" => &AR,
            _ => &EN,
        }
    }

    pub(crate) fn collection(&self, collection: CollectionType) -> &'static str {
        let idx = CollectionType::ALL.iter().position(|c| *c == collection).unwrap_or(0);
        self.collections[idx]
    }
}

static EN: Texts = Texts {
    skip_to_content: "Skip to content",
    languages: "Languages",
    home: "Home",
    read_more: "Read more",
    rss_feed: "RSS feed",
    loading: "Loading…",
    not_found_title: "Page not found",
    not_found_body: "The page you are looking for does not exist or was moved.",
    error_title: "Something went wrong",
    error_body: "This page could not be loaded. Please try again in a moment.",
    back_home: "Back to the start page",
    contents: "Contents",
    contact_us: "Contact us",
    no_entries: "Nothing has been published here yet.",
    gallery_server_only: "This component loads its own data and is only shown on real pages.",
    version: "Version",
    collections: ["Articles", "Documentation", "Changelog", "Newsletter", "Events"],

    submit: "Submit",
    sending: "Sending…",
    email: "Email",
    thank_you: "Thank you! We will get back to you soon.",
    required_field: "required",

    upcoming: "Upcoming",
    live: "Live now",
    completed: "Past event",
    register: "Register",
    close: "Close",
    join_online: "Join online",
    location: "Location",
    speakers: "Speakers",
    hours: "h",
    no_events: "No events match your selection.",
    all_events: "All events",
    layout: "View",
    layout_calendar: "Calendar",
    layout_cards: "Cards",
    layout_list: "List",
    layout_timeline: "Timeline",
    all_types: "All types",
    show_upcoming: "Upcoming",
    show_past: "Past",
    show_all: "All",
    webinar: "Webinar",
    video: "Video",
    physical: "On site",
    hybrid: "Hybrid",
    previous_month: "Previous month",
    next_month: "Next month",
    jump_to_next_event: "Jump to next event",
    weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
};

static DE: Texts = Texts {
    skip_to_content: "Zum Inhalt springen",
    languages: "Sprachen",
    home: "Startseite",
    read_more: "Weiterlesen",
    rss_feed: "RSS-Feed",
    loading: "Wird geladen…",
    not_found_title: "Seite nicht gefunden",
    not_found_body: "Die gesuchte Seite existiert nicht oder wurde verschoben.",
    error_title: "Etwas ist schiefgelaufen",
    error_body: "Diese Seite konnte nicht geladen werden. Bitte versuchen Sie es gleich noch einmal.",
    back_home: "Zurück zur Startseite",
    contents: "Inhalt",
    contact_us: "Kontakt aufnehmen",
    no_entries: "Hier wurde noch nichts veröffentlicht.",
    gallery_server_only: "Diese Komponente lädt eigene Daten und wird nur auf echten Seiten angezeigt.",
    version: "Version",
    collections: ["Artikel", "Dokumentation", "Änderungen", "Newsletter", "Veranstaltungen"],

    submit: "Absenden",
    sending: "Wird gesendet…",
    email: "E-Mail",
    thank_you: "Vielen Dank! Wir melden uns in Kürze.",
    required_field: "Pflichtfeld",

    upcoming: "Demnächst",
    live: "Jetzt live",
    completed: "Vergangen",
    register: "Anmelden",
    close: "Schließen",
    join_online: "Online teilnehmen",
    location: "Ort",
    speakers: "Sprecher:innen",
    hours: "Std.",
    no_events: "Keine Veranstaltungen entsprechen Ihrer Auswahl.",
    all_events: "Alle Veranstaltungen",
    layout: "Ansicht",
    layout_calendar: "Kalender",
    layout_cards: "Karten",
    layout_list: "Liste",
    layout_timeline: "Zeitleiste",
    all_types: "Alle Arten",
    show_upcoming: "Kommende",
    show_past: "Vergangene",
    show_all: "Alle",
    webinar: "Webinar",
    video: "Video",
    physical: "Vor Ort",
    hybrid: "Hybrid",
    previous_month: "Vorheriger Monat",
    next_month: "Nächster Monat",
    jump_to_next_event: "Zur nächsten Veranstaltung",
    weekdays: ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"],
};

static NB: Texts = Texts {
    skip_to_content: "Hopp til innhold",
    languages: "Språk",
    home: "Forside",
    read_more: "Les mer",
    rss_feed: "RSS-feed",
    loading: "Laster…",
    not_found_title: "Fant ikke siden",
    not_found_body: "Siden du leter etter finnes ikke eller er flyttet.",
    error_title: "Noe gikk galt",
    error_body: "Siden kunne ikke lastes. Prøv igjen om litt.",
    back_home: "Tilbake til forsiden",
    contents: "Innhold",
    contact_us: "Kontakt oss",
    no_entries: "Ingenting er publisert her ennå.",
    gallery_server_only: "Denne komponenten henter egne data og vises bare på ekte sider.",
    version: "Versjon",
    collections: ["Artikler", "Dokumentasjon", "Endringslogg", "Nyhetsbrev", "Arrangementer"],

    submit: "Send",
    sending: "Sender…",
    email: "E-post",
    thank_you: "Takk! Vi tar kontakt snart.",
    required_field: "påkrevd",

    upcoming: "Kommende",
    live: "Direkte nå",
    completed: "Avholdt",
    register: "Meld deg på",
    close: "Lukk",
    join_online: "Bli med på nett",
    location: "Sted",
    speakers: "Foredragsholdere",
    hours: "t",
    no_events: "Ingen arrangementer passer til utvalget ditt.",
    all_events: "Alle arrangementer",
    layout: "Visning",
    layout_calendar: "Kalender",
    layout_cards: "Kort",
    layout_list: "Liste",
    layout_timeline: "Tidslinje",
    all_types: "Alle typer",
    show_upcoming: "Kommende",
    show_past: "Tidligere",
    show_all: "Alle",
    webinar: "Webinar",
    video: "Video",
    physical: "Fysisk",
    hybrid: "Hybrid",
    previous_month: "Forrige måned",
    next_month: "Neste måned",
    jump_to_next_event: "Gå til neste arrangement",
    weekdays: ["man", "tir", "ons", "tor", "fre", "lør", "søn"],
};

static AR: Texts = Texts {
    skip_to_content: "انتقل إلى المحتوى",
    languages: "اللغات",
    home: "الرئيسية",
    read_more: "اقرأ المزيد",
    rss_feed: "موجز RSS",
    loading: "جارٍ التحميل…",
    not_found_title: "الصفحة غير موجودة",
    not_found_body: "الصفحة التي تبحث عنها غير موجودة أو تم نقلها.",
    error_title: "حدث خطأ ما",
    error_body: "تعذر تحميل هذه الصفحة. يرجى المحاولة مرة أخرى بعد قليل.",
    back_home: "العودة إلى الصفحة الرئيسية",
    contents: "المحتويات",
    contact_us: "تواصل معنا",
    no_entries: "لم يُنشر أي شيء هنا بعد.",
    gallery_server_only: "يحمّل هذا المكوّن بياناته الخاصة ويظهر فقط في الصفحات الفعلية.",
    version: "الإصدار",
    collections: ["المقالات", "التوثيق", "سجل التغييرات", "النشرة الإخبارية", "الفعاليات"],

    submit: "إرسال",
    sending: "جارٍ الإرسال…",
    email: "البريد الإلكتروني",
    thank_you: "شكرًا لك! سنتواصل معك قريبًا.",
    required_field: "مطلوب",

    upcoming: "قادم",
    live: "مباشر الآن",
    completed: "فعالية سابقة",
    register: "سجّل",
    close: "إغلاق",
    join_online: "انضم عبر الإنترنت",
    location: "الموقع",
    speakers: "المتحدثون",
    hours: "ساعة",
    no_events: "لا توجد فعاليات تطابق اختيارك.",
    all_events: "كل الفعاليات",
    layout: "العرض",
    layout_calendar: "التقويم",
    layout_cards: "بطاقات",
    layout_list: "قائمة",
    layout_timeline: "خط زمني",
    all_types: "كل الأنواع",
    show_upcoming: "القادمة",
    show_past: "السابقة",
    show_all: "الكل",
    webinar: "ندوة عبر الإنترنت",
    video: "فيديو",
    physical: "حضوري",
    hybrid: "مختلط",
    previous_month: "الشهر السابق",
    next_month: "الشهر التالي",
    jump_to_next_event: "انتقل إلى الفعالية التالية",
    weekdays: ["الإثنين", "الثلاثاء", "الأربعاء", "الخميس", "الجمعة", "السبت", "الأحد"],
};
