//! Text rendering for records, caps, and paginated listings.

use scorecap_core::{Breakdown, BreakdownRecord, CapSet, Note};

/// One page of a listing.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number, after clamping.
    pub number: usize,
    pub total_pages: usize,
    /// Index of the first item on this page within the full listing.
    pub offset: usize,
}

impl<T> Page<'_, T> {
    pub fn footer(&self) -> String {
        format!("Page {} of {}", self.number, self.total_pages)
    }
}

/// Slice out page `number` (1-based). Out-of-range numbers are clamped.
pub fn paginate<T>(items: &[T], number: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let number = number.clamp(1, total_pages);
    let offset = (number - 1) * per_page;
    let end = (offset + per_page).min(items.len());
    Page {
        items: &items[offset.min(end)..end],
        number,
        total_pages,
        offset,
    }
}

/// `alice smith` → `Alice Smith`.
pub fn title_case(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn note_text(note: Note) -> &'static str {
    match note {
        Note::Approx => "Values were auto-estimated based on percent.",
        Note::Overridden => "Some values were manually overridden.",
        Note::Revalidated => "Values were clamped after a cap change.",
    }
}

/// Each component next to its cap, one per line.
pub fn breakdown_lines(breakdown: &Breakdown, caps: &CapSet) -> Vec<String> {
    breakdown
        .iter()
        .map(|(component, value)| {
            format!(
                "{:<16} {} / {}",
                format!("{} ({})", component.label(), component),
                value,
                caps.get(component)
            )
        })
        .collect()
}

/// `a: 0.3   b: 0.446   c: 0.452   d: 0.452`
pub fn compact_breakdown(breakdown: &Breakdown) -> String {
    breakdown
        .iter()
        .map(|(component, value)| format!("{component}: {value}"))
        .collect::<Vec<_>>()
        .join("   ")
}

/// The full card shown by `view`.
pub fn record_card(name: &str, record: &BreakdownRecord, caps: &CapSet) -> Vec<String> {
    let mut lines = vec![format!(
        "📋 {}  📊 Performance: {:.2}%",
        title_case(name),
        record.percent
    )];
    lines.extend(breakdown_lines(&record.breakdown, caps).into_iter().map(|l| format!("   {l}")));
    if let Some(comment) = &record.comment {
        lines.push(format!("   🗒️  {comment}"));
    }
    lines.push(format!("   {}", note_text(record.note)));
    lines
}

/// `a ∈ [0, 0.3]   |   b ∈ [0, 1]   ...`
pub fn caps_line(caps: &CapSet) -> String {
    caps.iter()
        .map(|(component, cap)| format!("{component} ∈ [0, {cap}]"))
        .collect::<Vec<_>>()
        .join("   |   ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_splits_into_pages_of_ten() {
        let items: Vec<u32> = (0..23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.footer(), "Page 1 of 3");

        let last = paginate(&items, 3, 10);
        assert_eq!(last.items, &[20, 21, 22]);
        assert_eq!(last.offset, 20);
    }

    #[test]
    fn paginate_clamps_page_numbers() {
        let items: Vec<u32> = (0..5).collect();
        assert_eq!(paginate(&items, 0, 10).number, 1);
        assert_eq!(paginate(&items, 9, 10).number, 1);

        let empty: Vec<u32> = Vec::new();
        let page = paginate(&empty, 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.footer(), "Page 1 of 1");
    }

    #[test]
    fn title_case_capitalizes_words() {
        assert_eq!(title_case("alice"), "Alice");
        assert_eq!(title_case("big  bob"), "Big  Bob");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn card_includes_comment_and_note() {
        let mut record = BreakdownRecord::new(
            50.0,
            Breakdown::new(0.3, 0.446, 0.452, 0.452),
            Note::Approx,
        );
        record.comment = Some("steady".into());
        let card = record_card("alice", &record, &CapSet::default()).join("\n");

        assert!(card.contains("Alice"));
        assert!(card.contains("50.00%"));
        assert!(card.contains("Roster (a)"));
        assert!(card.contains("0.446 / 1"));
        assert!(card.contains("steady"));
        assert!(card.contains("auto-estimated"));
    }

    #[test]
    fn caps_line_lists_every_component() {
        let line = caps_line(&CapSet::default());
        assert_eq!(line, "a ∈ [0, 0.3]   |   b ∈ [0, 1]   |   c ∈ [0, 1]   |   d ∈ [0, 1]");
    }

    #[test]
    fn compact_breakdown_uses_component_keys() {
        let text = compact_breakdown(&Breakdown::new(0.1, 0.2, 0.3, 0.4));
        assert_eq!(text, "a: 0.1   b: 0.2   c: 0.3   d: 0.4");
    }
}
