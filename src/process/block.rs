// src/process/block.rs

//! Line-oriented state machine that lifts one commodity's table out of a
//! WASDE text bulletin.
//!
//! The bulletin never labels its rows; their meaning is fixed by vertical
//! position inside the block:
//!
//! | counter | slot          | column insertion                         |
//! |---------|---------------|------------------------------------------|
//! | 0       | actuals       | empty `month` at index 1, tag `data`     |
//! | 2       | year capture  | none; first token becomes the crop year  |
//! | 3, 4    | projection    | crop year prepended, tag `projected`     |
//! | other   | estimate      | tag `estimate`                           |

use serde::Serialize;
use tracing::trace;

use crate::error::MalformedLine;
use crate::process::row::{BalanceRow, RecordType, ROW_WIDTH};
use crate::process::utils::{is_crop_year, is_indented};

/// Zero-based count of lines consumed inside the block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineCounter(usize);

impl LineCounter {
    pub const ACTUALS: LineCounter = LineCounter(0);
    pub const YEAR_CAPTURE: LineCounter = LineCounter(2);
    pub const FIRST_PROJECTION: LineCounter = LineCounter(3);
    pub const LAST_PROJECTION: LineCounter = LineCounter(4);

    /// Lines a block needs for both projection rows to be present.
    pub const EXPECTED_MIN_LINES: usize = Self::LAST_PROJECTION.0 + 1;

    pub fn new(n: usize) -> Self {
        LineCounter(n)
    }

    pub fn get(self) -> usize {
        self.0
    }

    fn advance(&mut self) {
        self.0 += 1;
    }

    pub fn slot(self) -> LineSlot {
        match self {
            Self::ACTUALS => LineSlot::Actuals,
            Self::YEAR_CAPTURE => LineSlot::YearCapture,
            c if (Self::FIRST_PROJECTION..=Self::LAST_PROJECTION).contains(&c) => {
                LineSlot::Projection
            }
            _ => LineSlot::Estimate,
        }
    }
}

/// Row grammar position a counter value maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSlot {
    Actuals,
    YearCapture,
    Projection,
    Estimate,
}

impl LineSlot {
    /// Tag for emitted rows; the year-capture line emits nothing.
    pub fn record_type(self) -> Option<RecordType> {
        match self {
            LineSlot::Actuals => Some(RecordType::Data),
            LineSlot::YearCapture => None,
            LineSlot::Projection => Some(RecordType::Projected),
            LineSlot::Estimate => Some(RecordType::Estimate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Seeking,
    InBlock(LineCounter),
    Done,
}

/// What feeding one line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Outside the block, or after it closed.
    Ignored,
    /// The commodity label was seen; the next line is counter 0.
    Opened,
    /// The crop year for the projection rows was captured.
    CapturedYear(String),
    Emitted(RecordType),
    /// First flush-left line after the block; nothing further is read.
    Closed,
}

/// Deviations from the block layout the row grammar assumes. Rows are still
/// emitted; these exist so the vintage can be audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeFlag {
    /// The block ended before both projection rows were read.
    MissingProjections { lines_in_block: usize },
    /// A row after the projections does not start with a crop year, so it
    /// may be an additional projection month tagged as an estimate.
    ExtraProjectionCandidate { line_no: usize, first_token: String },
    /// A projection row whose month slot holds a crop year.
    ProjectionLooksLikeCropYear { line_no: usize, month: String },
    /// The year-capture line carried more than the year and its marker;
    /// everything after the year was dropped.
    FiguresOnYearLine { line_no: usize, tokens: usize },
}

impl std::fmt::Display for ShapeFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeFlag::MissingProjections { lines_in_block } => write!(
                f,
                "block has {} lines, expected at least {}",
                lines_in_block,
                LineCounter::EXPECTED_MIN_LINES
            ),
            ShapeFlag::ExtraProjectionCandidate {
                line_no,
                first_token,
            } => write!(
                f,
                "line {}: row after projections starts with `{}`, not a crop year",
                line_no, first_token
            ),
            ShapeFlag::ProjectionLooksLikeCropYear { line_no, month } => write!(
                f,
                "line {}: projection month slot holds crop year `{}`",
                line_no, month
            ),
            ShapeFlag::FiguresOnYearLine { line_no, tokens } => write!(
                f,
                "line {}: year line has {} tokens, only the crop year was kept",
                line_no, tokens
            ),
        }
    }
}

/// Result of scanning one bulletin whose commodity block was found.
#[derive(Debug, Clone, Default)]
pub struct ParsedBlock {
    pub rows: Vec<BalanceRow>,
    /// Indented lines consumed, including the year-capture line.
    pub lines_in_block: usize,
    pub flags: Vec<ShapeFlag>,
}

pub struct BlockParser<'a> {
    label: &'a str,
    state: BlockState,
    crop_year: Option<String>,
    lines_in_block: usize,
    rows: Vec<BalanceRow>,
    flags: Vec<ShapeFlag>,
}

impl<'a> BlockParser<'a> {
    /// `label` is matched case-sensitively against the start of each line.
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            state: BlockState::Seeking,
            crop_year: None,
            lines_in_block: 0,
            rows: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Advance the machine by one line. `line_no` is 1-based and only used
    /// for diagnostics.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Result<Step, MalformedLine> {
        match self.state {
            BlockState::Done => Ok(Step::Ignored),
            BlockState::Seeking => {
                if line.starts_with(self.label) {
                    trace!(line_no, "block opened");
                    self.state = BlockState::InBlock(LineCounter::default());
                    Ok(Step::Opened)
                } else {
                    Ok(Step::Ignored)
                }
            }
            BlockState::InBlock(mut counter) => {
                if !is_indented(line) {
                    trace!(line_no, "block closed");
                    self.state = BlockState::Done;
                    return Ok(Step::Closed);
                }
                self.lines_in_block += 1;
                let step = self.consume(line_no, line, counter)?;
                counter.advance();
                self.state = BlockState::InBlock(counter);
                Ok(step)
            }
        }
    }

    fn consume(
        &mut self,
        line_no: usize,
        line: &str,
        counter: LineCounter,
    ) -> Result<Step, MalformedLine> {
        let mut fields: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        let malformed = |found: usize| MalformedLine {
            line_no,
            expected: ROW_WIDTH,
            found,
            line: line.to_string(),
        };
        if fields.is_empty() {
            return Err(malformed(0));
        }

        let slot = counter.slot();
        trace!(line_no, counter = counter.get(), ?slot, "classify");

        let record_type = match slot {
            LineSlot::YearCapture => {
                // `2024/25 Proj.` is the expected shape
                if fields.len() > 2 {
                    self.flags.push(ShapeFlag::FiguresOnYearLine {
                        line_no,
                        tokens: fields.len(),
                    });
                }
                let year = fields.swap_remove(0);
                self.crop_year = Some(year.clone());
                return Ok(Step::CapturedYear(year));
            }
            LineSlot::Actuals => {
                fields.insert(1, String::new());
                RecordType::Data
            }
            LineSlot::Projection => {
                // counter 2 always precedes, so the year is set by now
                let year = self.crop_year.clone().ok_or_else(|| malformed(fields.len()))?;
                fields.insert(0, year);
                RecordType::Projected
            }
            LineSlot::Estimate => RecordType::Estimate,
        };
        fields.push(record_type.as_str().to_string());

        let row = BalanceRow::try_from_fields(fields).map_err(malformed)?;

        match slot {
            LineSlot::Projection if is_crop_year(&row.month) => {
                self.flags.push(ShapeFlag::ProjectionLooksLikeCropYear {
                    line_no,
                    month: row.month.clone(),
                });
            }
            LineSlot::Estimate if counter > LineCounter::LAST_PROJECTION && !is_crop_year(&row.year) => {
                self.flags.push(ShapeFlag::ExtraProjectionCandidate {
                    line_no,
                    first_token: row.year.clone(),
                });
            }
            _ => {}
        }

        self.rows.push(row);
        Ok(Step::Emitted(record_type))
    }

    /// `None` when the label was never seen.
    pub fn finish(self) -> Option<ParsedBlock> {
        if self.state == BlockState::Seeking {
            return None;
        }
        let mut flags = self.flags;
        if self.lines_in_block > 0 && self.lines_in_block < LineCounter::EXPECTED_MIN_LINES {
            flags.insert(
                0,
                ShapeFlag::MissingProjections {
                    lines_in_block: self.lines_in_block,
                },
            );
        }
        Some(ParsedBlock {
            rows: self.rows,
            lines_in_block: self.lines_in_block,
            flags,
        })
    }
}

/// Run the state machine over a whole bulletin. Returns `Ok(None)` when the
/// commodity label never appears.
pub fn parse_bulletin(text: &str, label: &str) -> Result<Option<ParsedBlock>, MalformedLine> {
    let mut parser = BlockParser::new(label);
    for (idx, line) in text.lines().enumerate() {
        if parser.feed(idx + 1, line)? == Step::Closed {
            break;
        }
    }
    Ok(parser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD_TABLE: &str = "\
                   World and U.S. Supply and Use for Grains 1/
                              Million Metric Tons
==============================================================================
                               Output     Total      Trade 2/    Total     Ending
                                          Supply                 Use 3/    Stocks
==============================================================================
Total Grains 4/
              2022/23        2,755.69   3,562.35    476.13   2,767.48    794.87
              2023/24 Est.   2,832.22   3,626.57    506.27   2,816.69    809.88
Wheat
              2022/23          789.17   1,061.54    220.55     791.41    270.13
              2023/24 Est.     791.04   1,061.16    222.02     799.61    261.55
              2024/25 Proj.
                       Jan     793.24   1,054.79    217.61     804.97    257.57
                       Feb     793.79   1,061.34    218.77     802.44    258.90
Coarse Grains 5/
              2022/23        1,448.72   1,757.38    213.91   1,445.42    311.96
";

    #[test]
    fn counters_map_to_named_slots() {
        assert_eq!(LineCounter::new(0).slot(), LineSlot::Actuals);
        assert_eq!(LineCounter::new(1).slot(), LineSlot::Estimate);
        assert_eq!(LineCounter::new(2).slot(), LineSlot::YearCapture);
        assert_eq!(LineCounter::new(3).slot(), LineSlot::Projection);
        assert_eq!(LineCounter::new(4).slot(), LineSlot::Projection);
        assert_eq!(LineCounter::new(5).slot(), LineSlot::Estimate);
        assert_eq!(LineCounter::new(40).slot(), LineSlot::Estimate);
        assert_eq!(LineSlot::YearCapture.record_type(), None);
    }

    #[test]
    fn extracts_wheat_block_from_world_table() {
        let block = parse_bulletin(WORLD_TABLE, "Wheat").unwrap().unwrap();
        assert_eq!(block.lines_in_block, 5);
        assert_eq!(block.rows.len(), 4);
        assert!(block.flags.is_empty(), "{:?}", block.flags);

        let actuals = &block.rows[0];
        assert_eq!(actuals.year, "2022/23");
        assert_eq!(actuals.month, "");
        assert_eq!(actuals.supply.raw(), "1,061.54");
        assert_eq!(actuals.record_type, RecordType::Data);

        let est = &block.rows[1];
        assert_eq!(est.year, "2023/24");
        assert_eq!(est.month, "Est.");
        assert_eq!(est.record_type, RecordType::Estimate);

        let jan = &block.rows[2];
        assert_eq!((jan.year.as_str(), jan.month.as_str()), ("2024/25", "Jan"));
        assert_eq!(jan.stocks.value(), Some(257.57));
        assert_eq!(jan.record_type, RecordType::Projected);

        let feb = &block.rows[3];
        assert_eq!((feb.year.as_str(), feb.month.as_str()), ("2024/25", "Feb"));
        assert_eq!(feb.record_type, RecordType::Projected);
    }

    #[test]
    fn six_line_block_emits_five_rows() {
        let text = "\
Wheat
   2021/22        779.3  1,056.2  203.6  792.2  264.0
   2022/23 Est.   789.2  1,061.5  220.5  791.4  270.1
   2023/24 Proj.
            Jan   790.3  1,060.4  213.2  798.6  261.8
            Feb   789.6  1,059.7  213.0  800.0  259.7
   2020/21 Est.   774.6  1,050.3  202.9  781.4  290.2
Corn
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.lines_in_block, 6);
        assert_eq!(block.rows.len(), block.lines_in_block - 1);

        let tags: Vec<RecordType> = block.rows.iter().map(|r| r.record_type).collect();
        assert_eq!(
            tags,
            vec![
                RecordType::Data,
                RecordType::Estimate,
                RecordType::Projected,
                RecordType::Projected,
                RecordType::Estimate,
            ]
        );
        assert!(block.rows[2..4].iter().all(|r| r.year == "2023/24"));
        assert_eq!(block.rows[4].year, "2020/21");
        assert!(block.flags.is_empty());
    }

    #[test]
    fn counter_semantics_ignore_line_content() {
        // the year-capture slot takes whatever sits at counter 2
        let text = "\
Wheat
   A  x 2 3 4 5
   B   y  1 2 3 4 5
   C
       m  1 2 3 4 5
       n  1 2 3 4 5
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        let rows = &block.rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].month, "");
        assert_eq!(rows[0].output.raw(), "x");
        assert_eq!(rows[1].year, "B");
        assert_eq!(rows[2].year, "C");
        assert_eq!(rows[3].year, "C");
    }

    #[test]
    fn label_match_is_case_sensitive_and_prefix_only() {
        let text = "wheat\n   2022/23  1 2 3 4 5\n  Wheat\n   2022/23  1 2 3 4 5\n";
        assert!(parse_bulletin(text, "Wheat").unwrap().is_none());
    }

    #[test]
    fn missing_label_yields_none() {
        assert!(parse_bulletin(WORLD_TABLE, "Rice").unwrap().is_none());
    }

    #[test]
    fn malformed_line_reports_position_and_width() {
        let text = "\
Wheat
   2022/23  789.17  1,061.54  220.55  791.41
";
        let err = parse_bulletin(text, "Wheat").unwrap_err();
        assert_eq!(err.line_no, 2);
        assert_eq!(err.expected, ROW_WIDTH);
        assert_eq!(err.found, 7);
    }

    #[test]
    fn whitespace_only_line_inside_block_is_malformed() {
        let text = "Wheat\n   2022/23  1 2 3 4 5\n    \n";
        let err = parse_bulletin(text, "Wheat").unwrap_err();
        assert_eq!((err.line_no, err.found), (3, 0));
    }

    #[test]
    fn block_is_read_once() {
        let text = "\
Wheat
   2022/23  1 2 3 4 5
Rice
Wheat
   garbage that would not parse
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.rows.len(), 1);
    }

    #[test]
    fn short_block_is_flagged() {
        let text = "Wheat\n   2022/23  1 2 3 4 5\n   2023/24 Est.  1 2 3 4 5\n   2024/25 Proj.\nCorn\n";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.rows.len(), 2);
        assert_eq!(
            block.flags,
            vec![ShapeFlag::MissingProjections { lines_in_block: 3 }]
        );
    }

    #[test]
    fn extra_projection_month_is_flagged() {
        let text = "\
Wheat
   2022/23        1 2 3 4 5
   2023/24 Est.   1 2 3 4 5
   2024/25 Proj.
            Jan   1 2 3 4 5
            Feb   1 2 3 4 5
            Mar  x  1 2 3 4 5
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.rows[4].record_type, RecordType::Estimate);
        assert_eq!(
            block.flags,
            vec![ShapeFlag::ExtraProjectionCandidate {
                line_no: 7,
                first_token: "Mar".into()
            }]
        );
    }

    #[test]
    fn flags_crop_year_in_projection_month_slot() {
        let text = "\
Wheat
   2023/24  1 2 3 4 5
   2024/25 Est.  1 2 3 4 5
   2025/26 Proj.
   2025/26  1 2 3 4 5
      Feb  1 2 3 4 5
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.rows.len(), 4);
        assert_eq!(block.rows[2].record_type, RecordType::Projected);
        assert_eq!(
            block.flags,
            vec![ShapeFlag::ProjectionLooksLikeCropYear {
                line_no: 5,
                month: "2025/26".into()
            }]
        );
    }

    #[test]
    fn flags_figures_on_year_line() {
        let text = "\
Wheat
   2022/23  1 2 3 4 5
   2023/24 Est.  1 2 3 4 5
   2024/25 Proj.  9 9 9 9 9
      Jan  1 2 3 4 5
      Feb  1 2 3 4 5
";
        let block = parse_bulletin(text, "Wheat").unwrap().unwrap();
        assert_eq!(block.rows.len(), 4);
        assert_eq!(block.rows[2].year, "2024/25");
        assert_eq!(
            block.flags,
            vec![ShapeFlag::FiguresOnYearLine {
                line_no: 4,
                tokens: 7
            }]
        );
    }

    #[test]
    fn empty_block_is_found_but_has_no_rows() {
        let block = parse_bulletin("Wheat\nCorn\n", "Wheat").unwrap().unwrap();
        assert_eq!(block.lines_in_block, 0);
        assert!(block.rows.is_empty());
        assert!(block.flags.is_empty());
    }

    #[test]
    fn feed_reports_each_transition() {
        let mut p = BlockParser::new("Wheat");
        assert_eq!(p.feed(1, "header").unwrap(), Step::Ignored);
        assert_eq!(p.feed(2, "Wheat").unwrap(), Step::Opened);
        assert_eq!(
            p.feed(3, "  2022/23  1 2 3 4 5").unwrap(),
            Step::Emitted(RecordType::Data)
        );
        assert_eq!(
            p.feed(4, "  2023/24 Est. 1 2 3 4 5").unwrap(),
            Step::Emitted(RecordType::Estimate)
        );
        assert_eq!(
            p.feed(5, "  2024/25 Proj.").unwrap(),
            Step::CapturedYear("2024/25".into())
        );
        assert_eq!(p.state(), BlockState::InBlock(LineCounter::FIRST_PROJECTION));
        assert_eq!(p.feed(6, "Corn").unwrap(), Step::Closed);
        assert_eq!(p.feed(7, "  2024/25 Proj.").unwrap(), Step::Ignored);
        assert_eq!(p.state(), BlockState::Done);
    }
}
