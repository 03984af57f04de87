use std::{collections::BTreeSet, ops::Bound};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use maud::{html, Markup};

use crate::{collections::CollectionType, render::{form::lead_form, RenderContext}};
use super::{type_label, EventStatus, EventView};


pub(super) fn cards(events: &[&EventView], ctx: &RenderContext<'_>) -> Markup {
    by_month(events, ctx, |group| html! {
        ul.event-cards.narrow[ctx.sidebar] {
            @for v in group {
                li.card.event data-event=(v.event.id) data-status=(v.status.as_str()) {
                    @if let Some(img) = &v.event.image { (ctx.image(img, 480)) }
                    p.badges { (badges(v, ctx)) }
                    h4 { (title_link(v, ctx)) }
                    p.when { (when(v, ctx)) }
                    @if let Some(summary) = &v.event.summary { p { (summary) } }
                    (registration(v, ctx))
                }
            }
        }
    })
}

pub(super) fn list(events: &[&EventView], ctx: &RenderContext<'_>) -> Markup {
    by_month(events, ctx, |group| html! {
        ul.event-list {
            @for v in group {
                li.event data-event=(v.event.id) data-status=(v.status.as_str()) {
                    @let start = v.start();
                    div.date-block aria-hidden="true" {
                        span.day { (start.day()) }
                        span.month { (start.format_localized("%b", ctx.locale.date_locale).to_string()) }
                    }
                    div.event-info {
                        h4 { (title_link(v, ctx)) }
                        p.when { (when(v, ctx)) }
                        p.badges { (badges(v, ctx)) }
                    }
                    (registration(v, ctx))
                }
            }
        }
    })
}

pub(super) fn timeline(events: &[&EventView], ctx: &RenderContext<'_>) -> Markup {
    by_month(events, ctx, |group| html! {
        ol.timeline {
            @for v in group {
                li.event data-event=(v.event.id) data-status=(v.status.as_str()) {
                    span.marker {}
                    div.timeline-content {
                        p.when { (when(v, ctx)) }
                        h4 { (title_link(v, ctx)) " " (badges(v, ctx)) }
                        @if let Some(summary) = &v.event.summary { p { (summary) } }
                        (registration(v, ctx))
                    }
                }
            }
        }
    })
}

/// Groups consecutive events by the month they start in (in their display
/// time zone) and renders every group with `render`.
fn by_month(
    events: &[&EventView],
    ctx: &RenderContext<'_>,
    render: impl Fn(&[&EventView]) -> Markup,
) -> Markup {
    if events.is_empty() {
        return html! { p.empty { (ctx.texts().no_events) } };
    }

    let mut groups: Vec<(DateTime<Tz>, Vec<&EventView>)> = Vec::new();
    for &v in events {
        let start = v.start();
        match groups.last_mut() {
            Some((first, group)) if (first.year(), first.month()) == (start.year(), start.month()) => {
                group.push(v);
            }
            _ => groups.push((start, vec![v])),
        }
    }

    html! {
        @for (first, group) in &groups {
            section.month-group {
                h3.month-heading { (first.format_localized("%B %Y", ctx.locale.date_locale).to_string()) }
                (render(group))
            }
        }
    }
}


/// Month grid for the month given by the `month` search parameter
/// (`YYYY-MM`), or [`default_month`].
pub(super) fn calendar(events: &[&EventView], ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    let month = ctx.params.get("month")
        .and_then(parse_month)
        .unwrap_or_else(|| default_month(events, ctx.now));

    let key = |m: NaiveDate| m.format("%Y-%m").to_string();
    let href = |m: NaiveDate| format!("{}{}", ctx.path, ctx.params.with("month", Some(&key(m))));
    let prev = month.checked_sub_months(Months::new(1));
    let next = month.checked_add_months(Months::new(1));
    let jump = next_event_month(&event_months(events), month);

    let leading = month.weekday().num_days_from_monday() as usize;
    let mut cells = std::iter::repeat(None).take(leading)
        .chain((1..=days_in_month(month)).map(|d| month.with_day(d)))
        .collect::<Vec<Option<NaiveDate>>>();
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    let today = ctx.now.date_naive();

    html! {
        div.calendar {
            header.calendar-nav {
                @if let Some(prev) = prev {
                    a.prev href=(href(prev)) rel="prev" aria-label=(texts.previous_month) { "‹" }
                }
                h3 { (month_label(month, ctx)) }
                @if let Some(next) = next {
                    a.next href=(href(next)) rel="next" aria-label=(texts.next_month) { "›" }
                }
                @if let Some(jump) = jump {
                    a.jump href=(href(jump)) data-jump-month=(key(jump)) { (texts.jump_to_next_event) }
                }
            }
            table.month-grid {
                thead {
                    tr { @for day in texts.weekdays { th scope="col" { (day) } } }
                }
                tbody {
                    @for week in cells.chunks(7) {
                        tr {
                            @for cell in week {
                                @match cell {
                                    Some(day) => td.today[*day == today] data-date=(day.to_string()) {
                                        span.day-number { (day.day()) }
                                        @for v in events.iter().filter(|v| v.start().date_naive() == *day) {
                                            a.calendar-event
                                                href=(event_path(v, ctx))
                                                data-event=(v.event.id)
                                                data-status=(v.status.as_str())
                                                title=(v.status.label(texts))
                                            {
                                                (v.start().format("%H:%M").to_string()) " " (v.event.title)
                                            }
                                        }
                                    },
                                    None => td.outside {},
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Month of the next upcoming or live event, or the current month if there
/// is none. `events` are ordered by start time.
pub(super) fn default_month(events: &[&EventView], now: DateTime<Utc>) -> NaiveDate {
    events.iter()
        .find(|v| v.status != EventStatus::Completed)
        .map(|v| first_of_month(v.start().date_naive()))
        .unwrap_or_else(|| first_of_month(now.date_naive()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn parse_month(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}

fn days_in_month(month: NaiveDate) -> u32 {
    month.checked_add_months(Months::new(1))
        .map(|next| (next - month).num_days() as u32)
        .unwrap_or(31)
}

fn month_label(month: NaiveDate, ctx: &RenderContext<'_>) -> String {
    Utc.from_utc_datetime(&month.and_time(NaiveTime::MIN))
        .format_localized("%B %Y", ctx.locale.date_locale)
        .to_string()
}

fn event_months(events: &[&EventView]) -> BTreeSet<NaiveDate> {
    events.iter().map(|v| first_of_month(v.start().date_naive())).collect()
}

/// The first month after `current` containing events, wrapping around to the
/// first one. `None` if no other month has events.
fn next_event_month(months: &BTreeSet<NaiveDate>, current: NaiveDate) -> Option<NaiveDate> {
    months.range((Bound::Excluded(current), Bound::Unbounded))
        .next()
        .or_else(|| months.iter().next())
        .copied()
        .filter(|m| *m != current)
}


fn event_path(v: &EventView, ctx: &RenderContext<'_>) -> String {
    ctx.registry.item_path(CollectionType::Events, ctx.locale, &v.event.slug)
}

fn title_link(v: &EventView, ctx: &RenderContext<'_>) -> Markup {
    html! { a href=(event_path(v, ctx)) { (v.event.title) } }
}

pub(super) fn badges(v: &EventView, ctx: &RenderContext<'_>) -> Markup {
    let texts = ctx.texts();
    html! {
        span.badge.status data-status=(v.status.as_str()) { (v.status.label(texts)) }
        " "
        span.badge.event-type { (type_label(v.event.event_type, texts)) }
    }
}

/// Date and time span, e.g. "10 March 2025, 13:00–14:00 CET".
pub(super) fn when(v: &EventView, ctx: &RenderContext<'_>) -> Markup {
    let start = v.start();
    let end = v.local_end();
    let time = |dt: &DateTime<Tz>| dt.format("%H:%M").to_string();

    html! {
        time datetime=(v.event.start_date_time.to_rfc3339()) {
            (ctx.date(&start)) ", " (time(&start))
        }
        "–"
        time datetime=(v.end.to_rfc3339()) {
            @if end.date_naive() != start.date_naive() { (ctx.date(&end)) ", " }
            (time(&end))
        }
        " " span.tz { (start.format("%Z").to_string()) }
    }
}

/// Register button plus dialog containing the registration form. Empty if
/// registration is not possible.
fn registration(v: &EventView, ctx: &RenderContext<'_>) -> Markup {
    let Some(form) = v.event.registration_form.as_ref().filter(|_| v.can_register()) else {
        return html! {};
    };
    let texts = ctx.texts();
    let id = format!("register-{}", v.event.id);

    html! {
        button.button.button-primary type="button" data-open-dialog=(id) { (texts.register) }
        dialog.registration id=(id) aria-labelledby=(format!("{id}-title")) {
            div.dialog-header {
                h2 id=(format!("{id}-title")) { (v.event.title) }
                button.close type="button" data-close-dialog aria-label=(texts.close) { "×" }
            }
            (lead_form(form, &v.lead_source(), ctx))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn month_helpers() {
        assert_eq!(parse_month("2025-02"), Some(d(2025, 2)));
        assert_eq!(parse_month("2025-13"), None);
        assert_eq!(parse_month("garbage"), None);
        assert_eq!(days_in_month(d(2024, 2)), 29);
        assert_eq!(days_in_month(d(2025, 2)), 28);
        assert_eq!(days_in_month(d(2025, 12)), 31);
    }

    #[test]
    fn jump_cycles_through_event_months() {
        let months = [d(2025, 1), d(2025, 5), d(2025, 7)].into_iter().collect();
        assert_eq!(next_event_month(&months, d(2025, 1)), Some(d(2025, 5)));
        assert_eq!(next_event_month(&months, d(2025, 3)), Some(d(2025, 5)));
        assert_eq!(next_event_month(&months, d(2025, 7)), Some(d(2025, 1)));
        assert_eq!(next_event_month(&months, d(2026, 1)), Some(d(2025, 1)));

        let single = [d(2025, 5)].into_iter().collect();
        assert_eq!(next_event_month(&single, d(2025, 5)), None);
        assert_eq!(next_event_month(&BTreeSet::new(), d(2025, 5)), None);
    }
}
