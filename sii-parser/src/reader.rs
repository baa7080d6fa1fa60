use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::Regex;

use crate::block::SiiBlock;
use crate::error::{Result, SiiError};

/// First significant line of every unit file
pub const HEADER: &str = "SiiNunit";

fn block_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^ \t]+)[ \t]*:[ \t]*([^ \t]+)[ \t]*\{$").expect("block start pattern")
    })
}

fn block_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^([^ \t]+)[ \t]*:[ \t]*([^ \t]+|"[^"]*")$"#).expect("block item pattern")
    })
}

#[derive(Debug)]
enum State {
    AwaitHeader,
    AwaitOuterBrace,
    InBlock,
    InBlockBody(SiiBlock),
    /// Footer seen, only ignorable lines may follow
    Done,
}

/// Lazy block reader over the lines of a unit file.
///
/// Yields each block as soon as its closing brace is read. After the first
/// error (or the end of input) the reader is exhausted for good.
pub struct SiiReader<L> {
    lines: L,
    state: State,
    line_no: usize,
    finished: bool,
}

impl<R: BufRead> SiiReader<io::Lines<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(reader.lines())
    }
}

impl<L> SiiReader<L>
where
    L: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: L) -> Self {
        Self {
            lines,
            state: State::AwaitHeader,
            line_no: 0,
            finished: false,
        }
    }

    /// Number of lines consumed so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    fn feed(&mut self, line: &str) -> Result<Option<SiiBlock>> {
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            return Ok(None);
        }

        let line_no = self.line_no;
        match std::mem::replace(&mut self.state, State::Done) {
            State::AwaitHeader => {
                if line != HEADER {
                    return Err(SiiError::MissingHeader { line: line_no, text: line.to_string() });
                }
                self.state = State::AwaitOuterBrace;
            }
            State::AwaitOuterBrace => {
                if line != "{" {
                    return Err(SiiError::ExpectedOpenBrace { line: line_no, text: line.to_string() });
                }
                self.state = State::InBlock;
            }
            State::InBlock => {
                if let Some(caps) = block_start_re().captures(line) {
                    self.state = State::InBlockBody(SiiBlock::new(&caps[1], &caps[2]));
                } else if line == "}" {
                    self.state = State::Done;
                } else {
                    return Err(SiiError::ExpectedBlockStart { line: line_no, text: line.to_string() });
                }
            }
            State::InBlockBody(mut block) => {
                if let Some(caps) = block_item_re().captures(line) {
                    block.insert(&caps[1], strip_quotes(&caps[2]).to_string());
                    self.state = State::InBlockBody(block);
                } else if line == "}" {
                    self.state = State::InBlock;
                    return Ok(Some(block));
                } else {
                    return Err(SiiError::ExpectedItem { line: line_no, text: line.to_string() });
                }
            }
            State::Done => {
                return Err(SiiError::TrailingData { line: line_no, text: line.to_string() });
            }
        }
        Ok(None)
    }
}

impl<L> Iterator for SiiReader<L>
where
    L: Iterator<Item = io::Result<String>>,
{
    type Item = Result<SiiBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(source)) => {
                    self.finished = true;
                    let line = self.line_no + 1;
                    return Some(Err(match source.kind() {
                        io::ErrorKind::InvalidData => SiiError::InvalidText { line },
                        _ => SiiError::Io { line, source },
                    }));
                }
                None => {
                    self.finished = true;
                    return match self.state {
                        State::Done => None,
                        _ => Some(Err(SiiError::UnexpectedEof { line: self.line_no })),
                    };
                }
            };
            self.line_no += 1;

            match self.feed(line.trim()) {
                Ok(Some(block)) => return Some(Ok(block)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<L> std::iter::FusedIterator for SiiReader<L> where L: Iterator<Item = io::Result<String>> {}

fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse a whole document held in memory
pub fn parse_str(text: &str) -> Result<Vec<SiiBlock>> {
    SiiReader::from_reader(text.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SiiValue;

    const ROAD_LOOK: &str = "SiiNunit\n{\nroad_look : road.look0 {\nroad_offset : 1.5\nlanes_left[] : traffic_lane.road.local\nlanes_left[] : traffic_lane.road.local\n}\n}\n";

    #[test]
    fn test_single_road_look_block() {
        let blocks = parse_str(ROAD_LOOK).unwrap();
        assert_eq!(blocks.len(), 1);

        let block = &blocks[0];
        assert_eq!(block.block_type, "road_look");
        assert_eq!(block.block_name, "road.look0");
        assert_eq!(block.items["road_offset"], SiiValue::Scalar("1.5".into()));
        assert_eq!(
            block.items["lanes_left[]"],
            SiiValue::Array(vec![
                "traffic_lane.road.local".into(),
                "traffic_lane.road.local".into(),
            ])
        );
    }

    #[test]
    fn test_missing_header_reports_line_one() {
        let err = parse_str("{\nfoo : bar {\n}\n}\n").unwrap_err();
        assert!(matches!(err, SiiError::MissingHeader { line: 1, .. }));
        assert_eq!(err.text(), Some("{"));
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let text = "# generated\n\nSiiNunit\n// outer\n{\n  # first\n  prefab_model : dlc.pf1 {\n    // path\n    prefab_desc: \"/prefab/cross/x1.ppd\"\n\n  }\n}\n# end\n";
        let blocks = parse_str(text).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].scalar("prefab_desc"), Some("/prefab/cross/x1.ppd"));
    }

    #[test]
    fn test_quoted_value_with_spaces() {
        let text = "SiiNunit\n{\nroad_look : road.look1 {\nname: \"Road 1 lane double\"\n}\n}\n";
        let blocks = parse_str(text).unwrap();
        assert_eq!(blocks[0].scalar("name"), Some("Road 1 lane double"));
    }

    #[test]
    fn test_block_start_without_spaces() {
        let blocks = parse_str("SiiNunit\n{\na:b{\nk:v\n}\n}\n").unwrap();
        assert_eq!(blocks[0].block_type, "a");
        assert_eq!(blocks[0].block_name, "b");
        assert_eq!(blocks[0].scalar("k"), Some("v"));
    }

    #[test]
    fn test_missing_outer_brace() {
        let err = parse_str("SiiNunit\nroad_look : a {\n").unwrap_err();
        assert!(matches!(err, SiiError::ExpectedOpenBrace { line: 2, .. }));
    }

    #[test]
    fn test_bad_item_line() {
        let err = parse_str("SiiNunit\n{\nroad_look : a {\nthis is not an item\n}\n}\n").unwrap_err();
        assert!(matches!(err, SiiError::ExpectedItem { line: 4, .. }));
        assert_eq!(err.text(), Some("this is not an item"));
    }

    #[test]
    fn test_bad_block_start() {
        let err = parse_str("SiiNunit\n{\nkey : value\n}\n").unwrap_err();
        assert!(matches!(err, SiiError::ExpectedBlockStart { line: 3, .. }));
    }

    #[test]
    fn test_trailing_data_after_footer() {
        let err = parse_str("SiiNunit\n{\n}\nleftover\n").unwrap_err();
        assert!(matches!(err, SiiError::TrailingData { line: 4, .. }));

        // Comments after the footer are still fine
        assert!(parse_str("SiiNunit\n{\n}\n# done\n").unwrap().is_empty());
    }

    #[test]
    fn test_truncated_document() {
        let err = parse_str("SiiNunit\n{\nroad_look : a {\nk : v\n").unwrap_err();
        assert!(matches!(err, SiiError::UnexpectedEof { line: 4 }));
    }

    #[test]
    fn test_blocks_yielded_lazily_then_fused() {
        let text = "SiiNunit\n{\na : one {\n}\nb : two {\n!!!\n}\n}\n";
        let mut reader = SiiReader::from_reader(text.as_bytes());

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.block_name, "one");
        assert_eq!(reader.line_no(), 4);

        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.line(), 6);
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_is_a_text_error() {
        let data: &[u8] = b"SiiNunit\n{\nroad_look : road.look0 {\nname: \"\xff\xfe\"\n}\n}\n";
        let err = SiiReader::from_reader(data).collect::<Result<Vec<_>>>().unwrap_err();

        assert!(matches!(err, SiiError::InvalidText { line: 4 }));
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = ROAD_LOOK.replace('\n', "\r\n");
        let blocks = parse_str(&text).unwrap();
        assert_eq!(blocks[0].array("lanes_left[]").len(), 2);
    }
}
