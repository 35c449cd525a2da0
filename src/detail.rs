//! Detail view-model
//!
//! Everything the UI needs to render one institution, computed from the
//! record alone plus the "Read More" toggles. Nothing here knows about
//! terminals; the TUI and the CLI both render from [`DetailView`].

use crate::directory::{InstitutionRecord, TriState};
use regex::Regex;
use std::sync::OnceLock;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Lines of a long-text block visible while collapsed
pub const DEFAULT_PREVIEW_LINES: usize = 3;

// ============================================================================
// Indicators
// ============================================================================

/// Icon shown next to a section heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Positive,
    Negative,
    Unknown,
}

impl Indicator {
    pub fn from_tristate(value: TriState) -> Self {
        match value {
            TriState::Yes => Indicator::Positive,
            TriState::No => Indicator::Negative,
            TriState::Unknown => Indicator::Unknown,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Indicator::Positive => "\u{2714}",
            Indicator::Negative => "\u{2718}",
            Indicator::Unknown => "?",
        }
    }
}

/// Paid leave is positive if any known value is above zero, negative if a
/// known value is zero, and unknown only when both are missing.
pub fn paid_leave_indicator(maternal: Option<u32>, paternal: Option<u32>) -> Indicator {
    let known = [maternal, paternal];
    if known.iter().flatten().any(|w| *w > 0) {
        Indicator::Positive
    } else if known.iter().flatten().any(|w| *w == 0) {
        Indicator::Negative
    } else {
        Indicator::Unknown
    }
}

// ============================================================================
// Citations
// ============================================================================

/// Piece of a citation: plain text or a clickable link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link(String),
}

/// One source citation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub segments: Vec<Segment>,
}

impl Citation {
    pub fn parse(entry: &str) -> Self {
        Self {
            segments: linkify(entry),
        }
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Link(url) => Some(url.as_str()),
            Segment::Text(_) => None,
        })
    }

    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(t) | Segment::Link(t) => t.as_str(),
            })
            .collect()
    }
}

/// How the citations are laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citations {
    None,
    Single(Citation),
    List(Vec<Citation>),
}

impl Citations {
    /// Split on `;`, trim, drop empties.
    pub fn parse(data_method: Option<&str>) -> Self {
        let mut entries: Vec<Citation> = data_method
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Citation::parse)
            .collect();

        match entries.len() {
            0 => Citations::None,
            1 => Citations::Single(entries.remove(0)),
            _ => Citations::List(entries),
        }
    }

    pub fn entries(&self) -> &[Citation] {
        match self {
            Citations::None => &[],
            Citations::Single(c) => std::slice::from_ref(c),
            Citations::List(list) => list,
        }
    }

    pub fn heading(&self) -> &'static str {
        if matches!(self, Citations::Single(_)) {
            "Source"
        } else {
            "Sources"
        }
    }
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://[^\s<>]+").expect("valid url regex"))
}

fn scheme_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^https?://(www\.)?").expect("valid scheme regex"))
}

/// Split text into plain and link segments.
pub fn linkify(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in url_regex().find_iter(text) {
        // Trailing sentence punctuation is not part of the link
        let url = m.as_str().trim_end_matches(['.', ',', ')', ']']);
        let host_start = url.find("://").map_or(0, |i| i + 3);
        if url.len() <= host_start {
            continue;
        }
        if m.start() > last {
            segments.push(Segment::Text(text[last..m.start()].to_string()));
        }
        segments.push(Segment::Link(url.to_string()));
        last = m.start() + url.len();
    }
    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    segments
}

/// URL for display: no scheme, no leading `www.`
pub fn display_url(url: &str) -> String {
    scheme_regex().replace(url, "").into_owned()
}

// ============================================================================
// Long Text
// ============================================================================

/// Replace mis-encoded punctuation and drop pipe characters.
pub fn clean_special_characters(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '|')
        .map(|c| match c {
            '\u{FFFD}' | '\u{0091}' | '\u{0092}' => '\'',
            '\u{0093}' | '\u{0094}' => '"',
            '\u{0096}' | '\u{0097}' => '-',
            other => other,
        })
        .collect()
}

/// Greedy word wrap by display width. Over-long words are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let sep = usize::from(!line.is_empty());
            if line.width() + sep + word.width() <= width {
                if sep == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if line.width() + ch_width > width && !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                line.push(ch);
            }
        }
        lines.push(line);
    }

    lines
}

/// Which long-text blocks are showing in full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandedSections {
    pub benefits: bool,
    pub other_details: bool,
}

/// Collapsible free-text block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongText {
    pub text: String,
    pub expanded: bool,
    pub preview_lines: usize,
}

impl LongText {
    fn new(text: &str, expanded: bool, preview_lines: usize) -> Self {
        Self {
            text: clean_special_characters(text),
            expanded,
            preview_lines,
        }
    }

    /// Whether the text is taller than the collapsed preview at `width`.
    pub fn overflows(&self, width: usize) -> bool {
        wrap(&self.text, width).len() > self.preview_lines
    }

    /// Lines to draw at `width`, honoring the toggle.
    pub fn visible_lines(&self, width: usize) -> Vec<String> {
        let mut lines = wrap(&self.text, width);
        if !self.expanded && lines.len() > self.preview_lines {
            lines.truncate(self.preview_lines);
            if let Some(last) = lines.last_mut() {
                last.push('\u{2026}');
            }
        }
        lines
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            "Show Less"
        } else {
            "Read More"
        }
    }
}

// ============================================================================
// Detail View
// ============================================================================

/// One leave figure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveLine {
    pub label: &'static str,
    pub text: String,
}

/// Footer block with name, address and site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub name: String,
    /// Street lines, shown between the name and the location
    pub address: Option<String>,
    pub location: String,
    pub url: Option<String>,
    pub url_display: Option<String>,
}

/// Everything needed to render a selected institution
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub title: String,
    pub paid_leave: Indicator,
    pub leave_lines: Vec<LeaveLine>,
    pub leave_note: Option<&'static str>,
    pub fertility: Indicator,
    pub fertility_message: &'static str,
    pub fertility_details: Vec<String>,
    pub elective: &'static str,
    pub benefits_offered: Option<LongText>,
    pub other_details: Option<LongText>,
    pub citations: Citations,
    pub footer: Footer,
}

impl DetailView {
    pub fn build(
        record: &InstitutionRecord,
        expanded: ExpandedSections,
        preview_lines: usize,
    ) -> Self {
        let leave_lines = [
            ("Maternal Leave", record.maternal_leave_weeks),
            ("Non-birthing Parental Leave", record.paternal_leave_weeks),
        ]
        .into_iter()
        .filter_map(|(label, weeks)| {
            weeks.map(|w| LeaveLine {
                label,
                text: format!("{} Weeks", w),
            })
        })
        .collect::<Vec<_>>();

        let leave_note = leave_lines
            .is_empty()
            .then_some("No paid leave information available");

        let fertility = Indicator::from_tristate(record.has_fertility_benefits);
        let fertility_message = match record.has_fertility_benefits {
            TriState::Yes => "Benefits offered",
            TriState::No => "No benefits offered",
            TriState::Unknown => "No fertility benefits information available",
        };

        let mut fertility_details = Vec::new();
        if record.has_fertility_benefits == TriState::Yes {
            if let Some(amount) = record.benefit_amount.filter(|a| *a > 0.0) {
                fertility_details.push(format_currency(amount));
            }
            if record.limits_for_coverage.as_deref() == Some("No") {
                fertility_details.push("No limits for coverage".to_string());
            }
        }

        let benefits_offered = record
            .benefits_offered
            .as_deref()
            .map(|text| LongText::new(text, expanded.benefits, preview_lines));
        let other_details = record
            .other_details
            .as_deref()
            .map(|text| LongText::new(text, expanded.other_details, preview_lines));

        let location = match &record.postal_code {
            Some(postal) => format!("{} {}", record.location(), postal),
            None => record.location(),
        };

        let paid_leave =
            paid_leave_indicator(record.maternal_leave_weeks, record.paternal_leave_weeks);

        Self {
            title: record.name.clone(),
            paid_leave,
            leave_lines,
            leave_note,
            fertility,
            fertility_message,
            fertility_details,
            elective: record.is_elective_treatment_covered.label(),
            benefits_offered,
            other_details,
            citations: Citations::parse(record.data_method.as_deref()),
            footer: Footer {
                name: record.name.clone(),
                address: record.street_address(),
                location,
                url_display: record.url.as_deref().map(display_url),
                url: record.url.clone(),
            },
        }
    }

    /// Every citation link, in display order.
    pub fn citation_links(&self) -> Vec<String> {
        self.citations
            .entries()
            .iter()
            .flat_map(|c| c.links().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }
}

/// `$12,500` style formatting
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if frac == 0 {
        format!("${}", grouped)
    } else {
        format!("${}.{:02}", grouped, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_leave_rules() {
        assert_eq!(paid_leave_indicator(Some(6), None), Indicator::Positive);
        assert_eq!(paid_leave_indicator(Some(0), Some(4)), Indicator::Positive);
        assert_eq!(paid_leave_indicator(Some(0), None), Indicator::Negative);
        assert_eq!(paid_leave_indicator(None, Some(0)), Indicator::Negative);
        assert_eq!(paid_leave_indicator(None, None), Indicator::Unknown);
    }

    #[test]
    fn unknown_fertility_with_zero_leave() {
        let mut record = InstitutionRecord::new("X", "Austin", "Texas");
        record.maternal_leave_weeks = Some(0);
        let view = DetailView::build(&record, ExpandedSections::default(), DEFAULT_PREVIEW_LINES);
        assert_eq!(view.paid_leave, Indicator::Negative);
        assert_eq!(view.fertility, Indicator::Unknown);
        assert_eq!(view.leave_lines.len(), 1);
        assert_eq!(view.leave_lines[0].text, "0 Weeks");
        assert_eq!(view.leave_note, None);
    }

    #[test]
    fn citations_two_items_with_link() {
        let citations = Citations::parse(Some("Direct outreach; https://example.edu/policy"));
        let Citations::List(items) = &citations else {
            panic!("expected a list, got {:?}", citations);
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].segments, vec![Segment::Text("Direct outreach".into())]);
        assert_eq!(
            items[1].segments,
            vec![Segment::Link("https://example.edu/policy".into())]
        );
        assert_eq!(citations.heading(), "Sources");
    }

    #[test]
    fn citations_single_and_empty() {
        assert_eq!(Citations::parse(None), Citations::None);
        assert_eq!(Citations::parse(Some(" ; ;")), Citations::None);
        let single = Citations::parse(Some("Program website;"));
        assert!(matches!(single, Citations::Single(_)));
        assert_eq!(single.heading(), "Source");
    }

    #[test]
    fn link_inside_text() {
        let segments = linkify("See http://a.org/x, then call.");
        assert_eq!(
            segments,
            vec![
                Segment::Text("See ".into()),
                Segment::Link("http://a.org/x".into()),
                Segment::Text(", then call.".into()),
            ]
        );
    }

    #[test]
    fn links_ignore_scheme_case_and_allow_short_hosts() {
        assert_eq!(
            linkify("See HTTPS://example.edu/policy"),
            vec![
                Segment::Text("See ".into()),
                Segment::Link("HTTPS://example.edu/policy".into()),
            ]
        );
        assert_eq!(linkify("http://a"), vec![Segment::Link("http://a".into())]);
        assert_eq!(
            linkify("see https://."),
            vec![Segment::Text("see https://.".into())]
        );
    }

    #[test]
    fn other_details_collapse_independently() {
        let mut record = InstitutionRecord::new("X", "", "");
        record.benefits_offered = Some("Progyny lifetime benefit".into());
        record.other_details = Some("Covers 3 IVF cycles|".into());

        let expanded = ExpandedSections {
            benefits: false,
            other_details: true,
        };
        let view = DetailView::build(&record, expanded, DEFAULT_PREVIEW_LINES);
        let benefits = view.benefits_offered.expect("benefits block");
        let other = view.other_details.expect("other details block");
        assert!(!benefits.expanded);
        assert!(other.expanded);
        assert_eq!(other.text, "Covers 3 IVF cycles");

        record.other_details = None;
        let view = DetailView::build(&record, expanded, DEFAULT_PREVIEW_LINES);
        assert_eq!(view.other_details, None);
    }

    #[test]
    fn footer_carries_street_address() {
        let mut record = InstitutionRecord::new("Mercy General", "Austin", "Texas");
        record.postal_code = Some("78701".into());
        let view = DetailView::build(&record, ExpandedSections::default(), 3);
        assert_eq!(view.footer.address, None);

        record.address_line1 = Some("1 Main St".into());
        record.address_line2 = Some("Suite 200".into());
        let view = DetailView::build(&record, ExpandedSections::default(), 3);
        assert_eq!(view.footer.address.as_deref(), Some("1 Main St Suite 200"));
        assert_eq!(view.footer.location, "Austin, Texas 78701");
    }

    #[test]
    fn fertility_details_only_when_offered() {
        let mut record = InstitutionRecord::new("X", "", "");
        record.has_fertility_benefits = TriState::Yes;
        record.benefit_amount = Some(25_000.0);
        record.limits_for_coverage = Some("No".into());
        let view = DetailView::build(&record, ExpandedSections::default(), DEFAULT_PREVIEW_LINES);
        assert_eq!(view.fertility_details, vec!["$25,000", "No limits for coverage"]);

        record.has_fertility_benefits = TriState::No;
        let view = DetailView::build(&record, ExpandedSections::default(), DEFAULT_PREVIEW_LINES);
        assert!(view.fertility_details.is_empty());
        assert_eq!(view.fertility_message, "No benefits offered");
    }

    #[test]
    fn elective_label_follows_record() {
        let mut record = InstitutionRecord::new("X", "", "");
        assert_eq!(DetailView::build(&record, ExpandedSections::default(), 3).elective, "Unknown");
        record.is_elective_treatment_covered = TriState::No;
        assert_eq!(DetailView::build(&record, ExpandedSections::default(), 3).elective, "No");
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1000.0), "$1,000");
        assert_eq!(format_currency(1234567.5), "$1,234,567.50");
    }

    #[test]
    fn url_display_strips_scheme_and_www() {
        assert_eq!(display_url("https://www.mercy.org/careers"), "mercy.org/careers");
        assert_eq!(display_url("HTTP://mercy.org"), "mercy.org");
        assert_eq!(display_url("mercy.org"), "mercy.org");
    }

    #[test]
    fn long_text_truncates_until_expanded() {
        let mut long = LongText {
            text: "one two three four five six".into(),
            expanded: false,
            preview_lines: 2,
        };
        assert!(long.overflows(9));
        let collapsed = long.visible_lines(9);
        assert_eq!(collapsed.len(), 2);
        assert!(collapsed[1].ends_with('\u{2026}'));
        assert_eq!(long.toggle_label(), "Read More");

        long.expanded = true;
        assert_eq!(
            long.visible_lines(9),
            vec!["one two", "three", "four five", "six"]
        );
        assert_eq!(long.toggle_label(), "Show Less");
    }

    #[test]
    fn wrap_splits_long_words() {
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap("a b", 10), vec!["a b"]);
    }

    #[test]
    fn cleans_pipes_and_replacement_chars() {
        assert_eq!(clean_special_characters("IVF|\u{FFFD}s cover"), "IVF's cover");
    }
}
