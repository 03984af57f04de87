//! Events: their derived status, filtering and the different layouts of the
//! events frontpage.
//!
//! The status of an event (upcoming, live, completed) is never stored. It is
//! computed from the start time, the duration and the render time by
//! [`EventStatus::at`], which is the only place implementing that rule.
//! Everything else (list layouts, calendar, detail page, registration) works
//! on [`EventView`]s that carry the computed status.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use maud::{html, Markup};
use serde::Deserialize;

use crate::{
    cms::ContentSource,
    locale::Locale,
    model::{Event, EventType, EventsFrontpage, LeadSource},
    prelude::*,
    render::{form::lead_form, portable_text, RenderContext, SearchParams, Texts},
};


mod layouts;


/// Events without (valid) duration are assumed to take this long.
pub(crate) const DEFAULT_DURATION_HOURS: f64 = 1.0;

/// Longer durations are clamped. Protects the date arithmetic from absurd
/// values entered in the CMS.
pub(crate) const MAX_DURATION_HOURS: f64 = 24.0 * 366.0;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventStatus {
    Upcoming,
    Live,
    Completed,
}

impl EventStatus {
    /// Status of an event starting at `start` and lasting `duration_hours`,
    /// at the point in time `now`. The event is live from its start up to
    /// and including its end.
    pub(crate) fn at(
        start: DateTime<Utc>,
        duration_hours: Option<f64>,
        now: DateTime<Utc>,
    ) -> Self {
        if now < start {
            EventStatus::Upcoming
        } else if now > end_time(start, duration_hours) {
            EventStatus::Completed
        } else {
            EventStatus::Live
        }
    }

    pub(crate) fn of(event: &Event, now: DateTime<Utc>) -> Self {
        Self::at(event.start_date_time, event.duration, now)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Live => "live",
            EventStatus::Completed => "completed",
        }
    }

    pub(crate) fn label(self, texts: &Texts) -> &'static str {
        match self {
            EventStatus::Upcoming => texts.upcoming,
            EventStatus::Live => texts.live,
            EventStatus::Completed => texts.completed,
        }
    }
}

/// End of an event. Missing, non-finite and non-positive durations count as
/// [`DEFAULT_DURATION_HOURS`].
pub(crate) fn end_time(start: DateTime<Utc>, duration_hours: Option<f64>) -> DateTime<Utc> {
    let hours = duration_hours
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or(DEFAULT_DURATION_HOURS)
        .min(MAX_DURATION_HOURS);
    let millis = (hours * 3_600_000.0).round() as i64;

    start.checked_add_signed(chrono::Duration::milliseconds(millis)).unwrap_or(start)
}


/// How the events frontpage presents its events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum EventLayout {
    Calendar,
    Cards,
    #[default]
    List,
    Timeline,
}

impl EventLayout {
    pub(crate) const ALL: [EventLayout; 4] =
        [EventLayout::List, EventLayout::Cards, EventLayout::Timeline, EventLayout::Calendar];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            EventLayout::Calendar => "calendar",
            EventLayout::Cards => "cards",
            EventLayout::List => "list",
            EventLayout::Timeline => "timeline",
        }
    }

    pub(crate) fn from_query(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }

    fn label(self, texts: &Texts) -> &'static str {
        match self {
            EventLayout::Calendar => texts.layout_calendar,
            EventLayout::Cards => texts.layout_cards,
            EventLayout::List => texts.layout_list,
            EventLayout::Timeline => texts.layout_timeline,
        }
    }
}

fn type_label(ty: EventType, texts: &Texts) -> &'static str {
    match ty {
        EventType::Webinar => texts.webinar,
        EventType::Video => texts.video,
        EventType::Physical => texts.physical,
        EventType::Hybrid => texts.hybrid,
    }
}


/// An event together with everything derived from it at render time.
#[derive(Debug, Clone)]
pub(crate) struct EventView {
    pub(crate) event: Event,
    pub(crate) status: EventStatus,
    pub(crate) end: DateTime<Utc>,
    /// Time zone the event is displayed in. Falls back to UTC if the event
    /// has none or an unknown one.
    pub(crate) tz: Tz,
}

impl EventView {
    pub(crate) fn new(event: Event, now: DateTime<Utc>) -> Self {
        let tz = match event.timezone.as_deref() {
            None => Tz::UTC,
            Some(name) => name.parse().unwrap_or_else(|_| {
                debug!("Unknown time zone '{name}' of event '{}', using UTC", event.id);
                Tz::UTC
            }),
        };

        Self {
            status: EventStatus::of(&event, now),
            end: end_time(event.start_date_time, event.duration),
            tz,
            event,
        }
    }

    pub(crate) fn start(&self) -> DateTime<Tz> {
        self.event.start_date_time.with_timezone(&self.tz)
    }

    pub(crate) fn local_end(&self) -> DateTime<Tz> {
        self.end.with_timezone(&self.tz)
    }

    /// Registration is offered until the event is over.
    pub(crate) fn can_register(&self) -> bool {
        self.status != EventStatus::Completed && self.event.registration_form.is_some()
    }

    pub(crate) fn lead_source(&self) -> LeadSource {
        LeadSource {
            kind: "event".into(),
            id: self.event.id.clone(),
            title: Some(self.event.title.clone()),
        }
    }
}

/// Loads all events of `locale`, ordered by start time, with their status
/// at `now`.
pub(crate) async fn fetch_events(
    source: &dyn ContentSource,
    locale: &'static Locale,
    now: DateTime<Utc>,
) -> Result<Vec<EventView>> {
    let events = source.events(locale).await
        .with_context(|| format!("failed to load events for locale '{locale}'"))?;

    let mut views = events.into_iter().map(|e| EventView::new(e, now)).collect::<Vec<_>>();
    views.sort_by_key(|v| v.event.start_date_time);
    Ok(views)
}


/// Which events to show based on their status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Show {
    /// Upcoming and live events.
    #[default]
    Upcoming,
    Past,
    All,
}

impl Show {
    const ALL: [Show; 3] = [Show::Upcoming, Show::Past, Show::All];

    fn as_str(self) -> &'static str {
        match self {
            Show::Upcoming => "upcoming",
            Show::Past => "past",
            Show::All => "all",
        }
    }

    fn label(self, texts: &Texts) -> &'static str {
        match self {
            Show::Upcoming => texts.show_upcoming,
            Show::Past => texts.show_past,
            Show::All => texts.show_all,
        }
    }
}

/// Filters selected via the `type` and `show` search parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Filter {
    pub(crate) event_type: Option<EventType>,
    pub(crate) show: Show,
}

impl Filter {
    /// Unknown values are ignored.
    pub(crate) fn from_params(params: &SearchParams) -> Self {
        Self {
            event_type: params.get("type").and_then(EventType::from_str),
            show: params.get("show")
                .and_then(|s| Show::ALL.into_iter().find(|show| show.as_str() == s))
                .unwrap_or_default(),
        }
    }

    fn matches_type(&self, v: &EventView) -> bool {
        self.event_type.map_or(true, |t| v.event.event_type == t)
    }

    fn matches(&self, v: &EventView) -> bool {
        let status_ok = match self.show {
            Show::Upcoming => v.status != EventStatus::Completed,
            Show::Past => v.status == EventStatus::Completed,
            Show::All => true,
        };
        status_ok && self.matches_type(v)
    }

    /// Filtered events. Past events are listed most recent first.
    fn apply<'a>(&self, events: &'a [EventView]) -> Vec<&'a EventView> {
        let mut out = events.iter().filter(|v| self.matches(v)).collect::<Vec<_>>();
        if self.show == Show::Past {
            out.reverse();
        }
        out
    }

    /// The calendar shows every month, so it only filters by type.
    fn apply_type<'a>(&self, events: &'a [EventView]) -> Vec<&'a EventView> {
        events.iter().filter(|v| self.matches_type(v)).collect()
    }
}


/// Renders the `events-frontpage` module.
pub(crate) async fn frontpage(m: &EventsFrontpage, ctx: &RenderContext<'_>) -> Result<Markup> {
    let events = fetch_events(ctx.source, ctx.locale, ctx.now).await?;
    let layout = ctx.params.get("layout")
        .and_then(EventLayout::from_query)
        .unwrap_or(m.default_layout);
    let filter = Filter::from_params(ctx.params);

    let body = match layout {
        EventLayout::Calendar => layouts::calendar(&filter.apply_type(&events), ctx),
        EventLayout::Cards => layouts::cards(&filter.apply(&events), ctx),
        EventLayout::List => layouts::list(&filter.apply(&events), ctx),
        EventLayout::Timeline => layouts::timeline(&filter.apply(&events), ctx),
    };

    Ok(html! {
        div.events data-layout=(layout.as_str()) {
            @if let Some(title) = &m.title { h2.module-title { (title) } }
            @if let Some(intro) = &m.intro { p.intro { (intro) } }
            @if m.show_filters { (controls(layout, &filter, ctx)) }
            (body)
        }
    })
}

fn controls(layout: EventLayout, filter: &Filter, ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let href = |key: &str, value: Option<&str>| format!("{}{}", ctx.path, ctx.params.with(key, value));
    let current = |yes: bool| yes.then_some("true");

    html! {
        nav.event-controls {
            div.segmented role="group" aria-label=(texts.layout) {
                @for l in EventLayout::ALL {
                    a href=(href("layout", Some(l.as_str()))) aria-current=[current(l == layout)] {
                        (l.label(texts))
                    }
                }
            }
            div.segmented role="group" {
                a href=(href("type", None)) aria-current=[current(filter.event_type.is_none())] {
                    (texts.all_types)
                }
                @for ty in EventType::ALL {
                    a href=(href("type", Some(ty.as_str())))
                        aria-current=[current(filter.event_type == Some(ty))]
                    {
                        (type_label(ty, texts))
                    }
                }
            }
            @if layout != EventLayout::Calendar {
                div.segmented role="group" {
                    @for show in Show::ALL {
                        a href=(href("show", Some(show.as_str())))
                            aria-current=[current(filter.show == show)]
                        {
                            (show.label(texts))
                        }
                    }
                }
            }
        }
    }
}

/// The next `limit` upcoming (or live) events as list. Used by the
/// `latest-articles` module when pointed at the events collection.
pub(crate) async fn upcoming_list(ctx: &RenderContext<'_>, limit: u32) -> Result<Markup> {
    let events = fetch_events(ctx.source, ctx.locale, ctx.now).await?;
    let upcoming = events.iter()
        .filter(|v| v.status != EventStatus::Completed)
        .take(limit as usize)
        .collect::<Vec<_>>();

    Ok(layouts::list(&upcoming, ctx))
}

/// Main content of an event's own page.
pub(crate) fn detail(v: &EventView, ctx: &RenderContext<'_>) -> Markup {
    let e = &v.event;
    let texts = ctx.texts();
    let location = e.location.as_ref().map(|l| l.one_line()).filter(|l| !l.is_empty());

    html! {
        article.event-detail data-status=(v.status.as_str()) data-event-type=(e.event_type.as_str()) {
            header {
                p.badges { (layouts::badges(v, ctx)) }
                h1 { (e.title) }
                p.when { (layouts::when(v, ctx)) }
                @if let Some(location) = location {
                    p.location { strong { (texts.location) ": " } (location) }
                }
                @if let Some(url) = e.online_url.as_ref().filter(|_| v.status != EventStatus::Completed) {
                    p { a.button.button-secondary href=(url) rel="noopener" { (texts.join_online) } }
                }
            }
            @if let Some(img) = &e.image {
                figure.event-image { (ctx.image(img, 1100)) }
            }
            @if let Some(summary) = &e.summary { p.lead { (summary) } }
            div.prose { (portable_text::render(&e.description, ctx)) }
            @if !e.speakers.is_empty() {
                section.speakers {
                    h2 { (texts.speakers) }
                    (crate::render::blocks::people(&e.speakers, ctx))
                }
            }
            @if let Some(form) = e.registration_form.as_ref().filter(|_| v.can_register()) {
                section.registration id="register" {
                    h2 { (texts.register) }
                    (lead_form(form, &v.lead_source(), ctx))
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use crate::{
        cms::memory::{from_json, MemorySource},
        model::Module,
        render::{render_modules, testing::Fixture},
    };
    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(id: &str, start: &str, extra: Value) -> Event {
        let mut v = json!({
            "_id": id,
            "title": format!("Event {id}"),
            "slug": id,
            "language": "en",
            "startDateTime": start,
            "eventType": "webinar",
            "_updatedAt": "2025-01-01T00:00:00Z",
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut v, extra) {
            base.extend(extra);
        }
        from_json(v)
    }

    fn form() -> Value {
        json!({ "_id": "reg", "fields": [{ "name": "name", "label": "Name", "kind": "text" }] })
    }

    #[test]
    fn status_boundaries() {
        let start = t("2025-03-10T12:00:00Z");
        let at = |now: &str| EventStatus::at(start, Some(1.0), t(now));

        assert_eq!(at("2025-03-10T11:59:59Z"), EventStatus::Upcoming);
        assert_eq!(at("2025-03-10T12:00:00Z"), EventStatus::Live);
        assert_eq!(at("2025-03-10T12:30:00Z"), EventStatus::Live);
        assert_eq!(at("2025-03-10T13:00:00Z"), EventStatus::Live);
        assert_eq!(at("2025-03-10T13:00:01Z"), EventStatus::Completed);

        assert_eq!(EventStatus::at(start, Some(2.5), t("2025-03-10T14:29:00Z")), EventStatus::Live);
        assert_eq!(EventStatus::at(start, Some(2.5), t("2025-03-10T14:31:00Z")), EventStatus::Completed);
    }

    #[test]
    fn invalid_durations_default_to_one_hour() {
        let start = t("2025-03-10T12:00:00Z");
        for duration in [None, Some(0.0), Some(-3.0), Some(f64::NAN), Some(f64::INFINITY)] {
            assert_eq!(end_time(start, duration), t("2025-03-10T13:00:00Z"), "{duration:?}");
        }
    }

    #[test]
    fn long_durations_are_capped() {
        let start = t("2025-03-10T12:00:00Z");
        let capped = start + chrono::Duration::days(366);
        assert_eq!(end_time(start, Some(1e300)), capped);
        assert_eq!(end_time(start, Some(MAX_DURATION_HOURS + 1.0)), capped);
        assert_eq!(end_time(start, Some(48.0)), t("2025-03-12T12:00:00Z"));
    }

    #[test]
    fn display_time_zone_does_not_change_status() {
        let now = t("2025-03-10T12:30:00Z");
        let utc = EventView::new(event("a", "2025-03-10T12:00:00Z", json!({})), now);
        let oslo = EventView::new(
            event("b", "2025-03-10T12:00:00Z", json!({ "timezone": "Europe/Oslo" })),
            now,
        );
        let broken = EventView::new(
            event("c", "2025-03-10T12:00:00Z", json!({ "timezone": "Mars/Olympus" })),
            now,
        );

        assert_eq!(utc.status, EventStatus::Live);
        assert_eq!(oslo.status, EventStatus::Live);
        assert_eq!(oslo.start().format("%H:%M").to_string(), "13:00");
        assert_eq!(broken.tz, Tz::UTC);
    }

    #[test]
    fn filters() {
        let now = t("2025-03-10T12:00:00Z");
        let events = [
            event("past", "2025-02-01T10:00:00Z", json!({})),
            event("live", "2025-03-10T11:30:00Z", json!({ "eventType": "physical" })),
            event("next", "2025-04-01T10:00:00Z", json!({})),
        ].map(|e| EventView::new(e, now));
        let ids = |params: &str| {
            Filter::from_params(&SearchParams::parse(Some(params)))
                .apply(&events)
                .iter()
                .map(|v| v.event.id.as_str())
                .collect::<Vec<_>>()
        };

        assert_eq!(ids(""), ["live", "next"]);
        assert_eq!(ids("show=past"), ["past"]);
        assert_eq!(ids("show=all"), ["past", "live", "next"]);
        assert_eq!(ids("show=all&type=physical"), ["live"]);
        assert_eq!(ids("show=bogus&type=bogus"), ["live", "next"]);
    }

    /// The status shown in lists, in the calendar and on the detail page must
    /// be the one `EventStatus::at` computes.
    #[tokio::test]
    async fn status_agrees_everywhere() {
        let source = MemorySource {
            events: vec![
                event("done", "2025-03-10T10:00:00Z", json!({ "duration": 1.5 })),
                event("now", "2025-03-10T11:00:00Z", json!({ "duration": 1 })),
                event("edge", "2025-03-10T11:00:00Z", json!({ "duration": null })),
                event("soon", "2025-03-10T12:00:01Z", json!({ "duration": -1 })),
            ],
            ..MemorySource::default()
        };
        let mut fx = Fixture::new(source);
        let now = fx.now;
        let expected = fx.source.events.iter()
            .map(|e| (e.id.clone(), EventStatus::at(e.start_date_time, e.duration, now).as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            expected.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            ["completed", "live", "live", "upcoming"],
        );

        let fetched = fetch_events(&fx.source, Locale::default_locale(), now).await.unwrap();
        for (v, (id, status)) in fetched.iter().zip(&expected) {
            assert_eq!(&v.event.id, id);
            assert_eq!(v.status.as_str(), *status);

            let detail = detail(v, &fx.ctx()).into_string();
            assert!(detail.contains(&format!(r#"data-status="{status}""#)), "detail of {id}");
        }

        for layout in ["list", "cards", "timeline", "calendar"] {
            fx.params = SearchParams::parse(Some(&format!("layout={layout}&show=all")));
            let modules: Vec<Module> = from_json(json!([{ "_type": "events-frontpage" }]));
            let out = render_modules(&modules, &fx.ctx()).await.into_string();
            for (id, status) in &expected {
                let needle = format!(r#"data-event="{id}" data-status="{status}""#);
                assert!(out.contains(&needle), "{layout}: missing {needle}");
            }
        }
    }

    #[tokio::test]
    async fn registration_only_until_event_is_over() {
        let source = MemorySource {
            events: vec![
                event("over", "2025-03-01T10:00:00Z", json!({ "registrationForm": form() })),
                event("soon", "2025-03-20T10:00:00Z", json!({ "registrationForm": form() })),
                event("no-form", "2025-03-21T10:00:00Z", json!({})),
            ],
            ..MemorySource::default()
        };
        let mut fx = Fixture::new(source);
        fx.params = SearchParams::parse(Some("show=all"));
        let modules: Vec<Module> = from_json(json!([{ "_type": "events-frontpage" }]));
        let out = render_modules(&modules, &fx.ctx()).await.into_string();

        assert!(out.contains(r#"<dialog class="registration" id="register-soon""#));
        assert!(!out.contains(r#"id="register-over""#));
        assert!(!out.contains(r#"id="register-no-form""#));
        assert!(out.contains(r#"data-source-type="event" data-source-id="soon""#));
    }

    #[tokio::test]
    async fn groups_by_month_in_display_time_zone() {
        let source = MemorySource {
            events: vec![
                // 00:30 on 1 April in Oslo
                event("late", "2025-03-31T22:30:00Z", json!({ "timezone": "Europe/Oslo" })),
            ],
            ..MemorySource::default()
        };
        let fx = Fixture::new(source);
        let modules: Vec<Module> = from_json(json!([{ "_type": "events-frontpage" }]));
        let out = render_modules(&modules, &fx.ctx()).await.into_string();
        assert!(out.contains("April 2025"), "{out}");
        assert!(!out.contains("March 2025"));
    }

    #[tokio::test]
    async fn calendar_defaults_to_next_event_and_cycles() {
        let source = MemorySource {
            events: vec![
                event("jan", "2025-01-15T10:00:00Z", json!({})),
                event("may", "2025-05-02T10:00:00Z", json!({})),
                event("jul", "2025-07-09T10:00:00Z", json!({})),
            ],
            ..MemorySource::default()
        };
        let mut fx = Fixture::new(source);
        let modules: Vec<Module> = from_json(json!([
            { "_type": "events-frontpage", "defaultLayout": "calendar" },
        ]));

        let out = render_modules(&modules, &fx.ctx()).await.into_string();
        assert!(out.contains("May 2025"));
        assert!(out.contains(r#"data-jump-month="2025-07""#));

        fx.params = SearchParams::parse(Some("month=2025-07"));
        let out = render_modules(&modules, &fx.ctx()).await.into_string();
        assert!(out.contains("July 2025"));
        assert!(out.contains(r#"data-jump-month="2025-01""#));

        // Without any upcoming events, the current month is shown.
        assert_eq!(
            layouts::default_month(&[], Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );
    }

    #[tokio::test]
    async fn upcoming_list_skips_completed() {
        let source = MemorySource {
            events: vec![
                event("old", "2025-01-01T10:00:00Z", json!({})),
                event("a", "2025-04-01T10:00:00Z", json!({})),
                event("b", "2025-05-01T10:00:00Z", json!({})),
            ],
            ..MemorySource::default()
        };
        let fx = Fixture::new(source);
        let out = upcoming_list(&fx.ctx(), 1).await.unwrap().into_string();
        assert!(out.contains(r#"data-event="a""#));
        assert!(!out.contains(r#"data-event="old""#));
        assert!(!out.contains(r#"data-event="b""#));
    }
}
