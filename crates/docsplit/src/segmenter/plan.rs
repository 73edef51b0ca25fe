use crate::analyzer::PageSignal;
use crate::processor::Barcode;

/// Where one output document comes from in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    /// 1-based position among separators, or 1 when the source has none.
    /// Dropped segments leave a gap in the numbering.
    pub sequence: usize,
    /// 1-based inclusive range reported for the segment.
    pub page_start: usize,
    pub page_end: usize,
    /// 0-based indices of the non-blank pages copied into the output.
    pub content_pages: Vec<usize>,
    pub barcode: Option<Barcode>,
    pub blank_pages_skipped: usize,
    /// Non-empty OCR text of the retained pages, in page order.
    pub ocr_texts: Vec<String>,
}

impl SegmentPlan {
    pub fn total_pages(&self) -> usize {
        self.content_pages.len()
    }

    /// OCR text of the segment joined by single spaces, `None` when no page
    /// produced text.
    pub fn joined_text(&self) -> Option<String> {
        if self.ocr_texts.is_empty() {
            None
        } else {
            Some(self.ocr_texts.join(" "))
        }
    }
}

/// A separator-delimited range that had nothing but blank pages after the
/// separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSegment {
    pub sequence: usize,
    pub page_start: usize,
    pub page_end: usize,
    pub barcode: Option<Barcode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentationPlan {
    pub segments: Vec<SegmentPlan>,
    pub dropped: Vec<DroppedSegment>,
    /// Pages before the first separator. They belong to no segment.
    pub leading_pages_ignored: usize,
}

/// Decides the segments for an ordered signal sequence. Pure.
pub fn plan(signals: &[PageSignal]) -> SegmentationPlan {
    let separators: Vec<usize> = signals
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_separator())
        .map(|(idx, _)| idx)
        .collect();

    if separators.is_empty() {
        return plan_without_separators(signals);
    }

    let mut result = SegmentationPlan {
        leading_pages_ignored: separators[0],
        ..Default::default()
    };

    for (i, &start) in separators.iter().enumerate() {
        let end = separators
            .get(i + 1)
            .map(|next| next - 1)
            .unwrap_or(signals.len() - 1);
        let sequence = i + 1;
        let barcode = signals[start].barcode().cloned();

        let (content_pages, ocr_texts, blank_pages_skipped) =
            collect_content(signals, start + 1, end);

        if content_pages.is_empty() {
            result.dropped.push(DroppedSegment {
                sequence,
                page_start: start + 2,
                page_end: end + 1,
                barcode,
            });
            continue;
        }

        result.segments.push(SegmentPlan {
            sequence,
            page_start: start + 2,
            page_end: end + 1,
            content_pages,
            barcode,
            blank_pages_skipped,
            ocr_texts,
        });
    }

    result
}

fn plan_without_separators(signals: &[PageSignal]) -> SegmentationPlan {
    if signals.is_empty() {
        return SegmentationPlan::default();
    }

    let (content_pages, ocr_texts, blank_pages_skipped) =
        collect_content(signals, 0, signals.len() - 1);

    if content_pages.is_empty() {
        return SegmentationPlan::default();
    }

    SegmentationPlan {
        segments: vec![SegmentPlan {
            sequence: 1,
            page_start: 1,
            page_end: signals.len(),
            content_pages,
            barcode: None,
            blank_pages_skipped,
            ocr_texts,
        }],
        ..Default::default()
    }
}

/// Non-blank pages in `[from, to]` (0-based, inclusive). `from > to` yields
/// an empty range.
fn collect_content(signals: &[PageSignal], from: usize, to: usize) -> (Vec<usize>, Vec<String>, usize) {
    let mut content_pages = Vec::new();
    let mut ocr_texts = Vec::new();
    let mut blanks = 0;

    if from > to {
        return (content_pages, ocr_texts, blanks);
    }

    for (idx, signal) in signals.iter().enumerate().take(to + 1).skip(from) {
        if signal.is_blank() {
            blanks += 1;
            continue;
        }
        content_pages.push(idx);
        if let Some(text) = signal.ocr_text().filter(|t| !t.is_empty()) {
            ocr_texts.push(text.to_string());
        }
    }

    (content_pages, ocr_texts, blanks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    enum P {
        Blank,
        Sep(&'static str),
        Text(&'static str),
    }

    fn signals(pages: &[P]) -> Vec<PageSignal> {
        pages
            .iter()
            .enumerate()
            .map(|(i, p)| match p {
                P::Blank => PageSignal::blank(i + 1),
                P::Sep(code) => PageSignal::separator(i + 1, Barcode::new(*code, "CODE-128")),
                P::Text(text) => PageSignal::content(i + 1, Some(text.to_string())),
            })
            .collect()
    }

    #[test]
    fn test_no_separators_single_segment() {
        let plan = plan(&signals(&[P::Text("a"), P::Blank, P::Text("b")]));

        assert_eq!(plan.segments.len(), 1);
        let seg = &plan.segments[0];
        assert_eq!(seg.sequence, 1);
        assert_eq!((seg.page_start, seg.page_end), (1, 3));
        assert_eq!(seg.content_pages, vec![0, 2]);
        assert_eq!(seg.blank_pages_skipped, 1);
        assert!(seg.barcode.is_none());
        assert_eq!(seg.joined_text().as_deref(), Some("a b"));
    }

    #[test]
    fn test_all_blank_yields_nothing() {
        let plan = plan(&signals(&[P::Blank, P::Blank]));
        assert!(plan.segments.is_empty());
        assert!(plan.dropped.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(plan(&[]), SegmentationPlan::default());
    }

    #[test]
    fn test_separator_ranges() {
        let plan = plan(&signals(&[
            P::Sep("CED"),
            P::Text("cedula"),
            P::Text("reverso"),
            P::Sep("CERT"),
            P::Blank,
            P::Text("certificado"),
        ]));

        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.leading_pages_ignored, 0);

        let first = &plan.segments[0];
        assert_eq!((first.page_start, first.page_end), (2, 3));
        assert_eq!(first.content_pages, vec![1, 2]);
        assert_eq!(first.barcode.as_ref().unwrap().value, "CED");

        let second = &plan.segments[1];
        assert_eq!(second.sequence, 2);
        assert_eq!((second.page_start, second.page_end), (5, 6));
        assert_eq!(second.content_pages, vec![5]);
        assert_eq!(second.blank_pages_skipped, 1);
    }

    #[test]
    fn test_empty_segment_is_dropped_and_keeps_gap() {
        let plan = plan(&signals(&[
            P::Sep("CED"),
            P::Blank,
            P::Sep("CERT"),
            P::Text("x"),
        ]));

        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.segments[0].sequence, 2);
        assert_eq!(plan.dropped.len(), 1);
        assert_eq!(plan.dropped[0].sequence, 1);
        assert_eq!(plan.dropped[0].barcode.as_ref().unwrap().value, "CED");
    }

    #[test]
    fn test_trailing_separator_is_dropped() {
        let plan = plan(&signals(&[P::Sep("CED"), P::Text("x"), P::Sep("MEC")]));

        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.dropped.len(), 1);
        assert_eq!(plan.dropped[0].page_start, 4);
        assert_eq!(plan.dropped[0].page_end, 3);
    }

    #[test]
    fn test_consecutive_separators() {
        let plan = plan(&signals(&[P::Sep("A"), P::Sep("B"), P::Text("x")]));
        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.segments[0].barcode.as_ref().unwrap().value, "B");
        assert_eq!(plan.dropped.len(), 1);
    }

    #[test]
    fn test_leading_pages_are_ignored() {
        let plan = plan(&signals(&[
            P::Text("cover"),
            P::Text("index"),
            P::Sep("CED"),
            P::Text("x"),
        ]));

        assert_eq!(plan.leading_pages_ignored, 2);
        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.segments[0].content_pages, vec![3]);
    }

    #[test]
    fn test_segments_never_overlap() {
        let plan = plan(&signals(&[
            P::Sep("A"),
            P::Text("1"),
            P::Sep("B"),
            P::Text("2"),
            P::Text("3"),
            P::Sep("C"),
            P::Blank,
            P::Text("4"),
        ]));

        let separators = 3;
        assert!(plan.segments.len() <= separators);
        for pair in plan.segments.windows(2) {
            assert!(pair[0].page_end < pair[1].page_start);
            assert!(pair[0].content_pages.last() < pair[1].content_pages.first());
        }
        for seg in &plan.segments {
            assert!(seg.page_start <= seg.page_end);
        }
    }

    #[test]
    fn test_missing_or_empty_ocr_is_skipped_in_text() {
        let mut sigs = signals(&[P::Sep("A"), P::Text(""), P::Text("hola")]);
        sigs.push(PageSignal::content(4, None));

        let plan = plan(&sigs);
        let seg = &plan.segments[0];
        assert_eq!(seg.content_pages, vec![1, 2, 3]);
        assert_eq!(seg.joined_text().as_deref(), Some("hola"));
    }
}
