//! Textual maze description.
//!
//! ```text
//! <width> <height> <startRow> <startCol> <goalRow> <goalCol>
//! <height lines of <width> whitespace separated tokens>
//! ```
//! `#` is a wall, `S` the start, `G` the goal, `C` or `K` a crystal, anything
//! else empty floor. Tokens after the first `width` of a row are ignored.

use std::fmt::Display;

use thiserror::Error;

use crate::{CellKind, Grid, MazeLayout, Position};

/// Why a maze description was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("the header is missing")]
    MissingHeader,
    #[error("the header has {found} fields, 6 are needed")]
    ShortHeader { found: usize },
    #[error("header field `{field}` is not a number: {token:?}")]
    BadHeaderField { field: &'static str, token: String },
    #[error("the grid is empty ({width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("a {width}x{height} grid cannot be addressed")]
    TooLarge { width: usize, height: usize },
    #[error("the {what} {pos} is outside of the grid")]
    OutsideGrid { what: &'static str, pos: Position },
    #[error("start and goal are both at {0}")]
    StartIsGoal(Position),
    #[error("row {row} is missing")]
    MissingRow { row: usize },
    #[error("row {row} has {found} tokens, {expected} are needed")]
    ShortRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// A maze description that cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed maze at line {line}: {reason}")]
pub struct MalformedMazeInput {
    /// 1-based line the problem was found on
    pub line: usize,
    pub reason: MalformedReason,
}

const HEADER_FIELDS: [&str; 6] = [
    "width",
    "height",
    "start row",
    "start column",
    "goal row",
    "goal column",
];

fn header(line: usize, text: &str) -> Result<[usize; 6], MalformedMazeInput> {
    let malformed = |reason| MalformedMazeInput { line, reason };
    let tokens: Vec<&str> = text.split_whitespace().take(6).collect();
    if tokens.len() < 6 {
        return Err(malformed(MalformedReason::ShortHeader {
            found: tokens.len(),
        }));
    }
    let mut fields = [0; 6];
    for ((field, token), name) in fields.iter_mut().zip(tokens).zip(HEADER_FIELDS) {
        *field = token.parse().map_err(|_| {
            malformed(MalformedReason::BadHeaderField {
                field: name,
                token: token.to_owned(),
            })
        })?;
    }
    Ok(fields)
}

/// Parse a maze description.
///
/// The header coordinates are authoritative: the start and goal tiles are
/// written there, and stray `S`/`G` tokens elsewhere become empty floor.
///
/// ```
/// use grid::{parse, CellKind, Position};
///
/// let maze = parse("3 2 0 0 1 2\nS . #\n. C G\n").unwrap();
/// assert_eq!(maze.start, Position::new(0, 0));
/// assert_eq!(maze.goal, Position::new(2, 1));
/// assert_eq!(maze.grid.cell_at(Position::new(1, 1)).unwrap().kind(), CellKind::Crystal);
/// ```
pub fn parse(text: &str) -> Result<MazeLayout, MalformedMazeInput> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let (header_line, header_text) = lines
        .by_ref()
        .find(|(_, l)| !l.trim().is_empty())
        .ok_or(MalformedMazeInput {
            line: 1,
            reason: MalformedReason::MissingHeader,
        })?;
    let [width, height, start_y, start_x, goal_y, goal_x] = header(header_line, header_text)?;
    let malformed = |reason| MalformedMazeInput {
        line: header_line,
        reason,
    };
    if width == 0 || height == 0 {
        return Err(malformed(MalformedReason::EmptyGrid { width, height }));
    }
    if width.checked_mul(height).is_none() {
        return Err(malformed(MalformedReason::TooLarge { width, height }));
    }

    let start = Position::new(start_x, start_y);
    let goal = Position::new(goal_x, goal_y);
    let inside = |pos: Position| pos.x < width && pos.y < height;
    for (what, pos) in [("start", start), ("goal", goal)] {
        if !inside(pos) {
            return Err(malformed(MalformedReason::OutsideGrid { what, pos }));
        }
    }
    if start == goal {
        return Err(malformed(MalformedReason::StartIsGoal(start)));
    }

    // rows are read before the grid is allocated, so its size is bounded by the input
    let mut kinds = Vec::new();
    for y in 0..height {
        let (line, row) = lines.next().ok_or(MalformedMazeInput {
            line: header_line + y + 1,
            reason: MalformedReason::MissingRow { row: y },
        })?;
        let tokens: Vec<&str> = row.split_whitespace().take(width).collect();
        if tokens.len() < width {
            return Err(MalformedMazeInput {
                line,
                reason: MalformedReason::ShortRow {
                    row: y,
                    found: tokens.len(),
                    expected: width,
                },
            });
        }
        for (x, token) in tokens.into_iter().enumerate() {
            let pos = Position::new(x, y);
            kinds.push(match CellKind::from_token(token) {
                CellKind::Start if pos != start => {
                    log::warn!("Ignoring start marker at {pos}, the header puts it at {start}");
                    CellKind::Empty
                }
                CellKind::Goal if pos != goal => {
                    log::warn!("Ignoring goal marker at {pos}, the header puts it at {goal}");
                    CellKind::Empty
                }
                kind => kind,
            });
        }
    }

    let mut grid = Grid::new(width, height);
    for (i, kind) in kinds.into_iter().enumerate() {
        grid.set_kind(Position::new(i % width, i / width), kind)
            .expect("Exactly width * height kinds were read");
    }
    grid.set_kind(start, CellKind::Start)
        .expect("The start was checked to be inside the grid");
    grid.set_kind(goal, CellKind::Goal)
        .expect("The goal was checked to be inside the grid");

    log::debug!("Parsed a {width}x{height} maze, start {start}, goal {goal}");
    Ok(MazeLayout { grid, start, goal })
}

impl Display for MazeLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} {} {} {} {} {}",
            self.grid.width(),
            self.grid.height(),
            self.start.y,
            self.start.x,
            self.goal.y,
            self.goal.x
        )?;
        write!(f, "{}", self.grid)
    }
}

#[cfg(test)]
mod tests {
    mod parse {
        use crate::format::{MalformedMazeInput, MalformedReason};
        use crate::{parse, CellKind, Position};

        const SMALL: &str = "4 3 0 0 2 3\nS . . #\n# C . .\n. . K G\n";

        #[test]
        fn deterministic() {
            assert_eq!(parse(SMALL), parse(SMALL));
        }

        #[test]
        fn tokens() {
            let maze = parse(SMALL).unwrap();
            let kind = |x, y| maze.grid.cell_at(Position::new(x, y)).unwrap().kind();
            assert_eq!(kind(0, 0), CellKind::Start);
            assert_eq!(kind(3, 0), CellKind::Wall);
            assert_eq!(kind(1, 1), CellKind::Crystal);
            assert_eq!(kind(2, 2), CellKind::Crystal);
            assert_eq!(kind(3, 2), CellKind::Goal);
            assert_eq!(kind(2, 1), CellKind::Empty);
        }

        #[test]
        fn extra_tokens_are_ignored() {
            let maze = parse("2 1 0 0 0 1\nS G # # #\n").unwrap();
            assert_eq!(maze.grid.width(), 2);
        }

        #[test]
        fn header_wins_over_markers() {
            let maze = parse("3 1 0 2 0 0\nS G .\n").unwrap();
            assert_eq!(maze.start, Position::new(2, 0));
            assert_eq!(maze.goal, Position::new(0, 0));
            assert_eq!(maze.grid.count(CellKind::Start), 1);
            assert_eq!(maze.grid.count(CellKind::Goal), 1);
            assert_eq!(
                maze.grid.cell_at(Position::new(1, 0)).unwrap().kind(),
                CellKind::Empty
            );
        }

        #[test]
        fn leading_blank_lines() {
            let maze = parse("\n\n2 1 0 0 0 1\nS G\n").unwrap();
            assert_eq!(maze.goal, Position::new(1, 0));
        }

        #[test]
        fn bad_header() {
            assert_eq!(
                parse("4 three 0 0 1 1\n"),
                Err(MalformedMazeInput {
                    line: 1,
                    reason: MalformedReason::BadHeaderField {
                        field: "height",
                        token: "three".to_owned()
                    }
                })
            );
            assert_eq!(
                parse("4 3 0 0\n").unwrap_err().reason,
                MalformedReason::ShortHeader { found: 4 }
            );
            assert_eq!(
                parse("   \n").unwrap_err().reason,
                MalformedReason::MissingHeader
            );
        }

        #[test]
        fn bad_positions() {
            assert!(matches!(
                parse("2 2 0 0 5 0\n. .\n. .\n").unwrap_err().reason,
                MalformedReason::OutsideGrid { what: "goal", .. }
            ));
            assert_eq!(
                parse("2 2 1 1 1 1\n. .\n. .\n").unwrap_err().reason,
                MalformedReason::StartIsGoal(Position::new(1, 1))
            );
            assert_eq!(
                parse("0 2 0 0 1 0\n").unwrap_err().reason,
                MalformedReason::EmptyGrid {
                    width: 0,
                    height: 2
                }
            );
        }

        #[test]
        fn huge_headers_are_rejected() {
            assert_eq!(
                parse("100000000000 100000000000 0 0 0 1\n")
                    .unwrap_err()
                    .reason,
                MalformedReason::TooLarge {
                    width: 100000000000,
                    height: 100000000000
                }
            );
            // addressable, but far more tiles than the text holds
            let err = parse("100000 100000 0 0 0 1\n").unwrap_err();
            assert_eq!(err.line, 2);
            assert_eq!(err.reason, MalformedReason::MissingRow { row: 0 });
            let err = parse("100000 2 0 0 0 1\nS G\n").unwrap_err();
            assert!(matches!(err.reason, MalformedReason::ShortRow { row: 0, found: 2, .. }));
        }

        #[test]
        fn missing_row() {
            let err = parse("2 3 0 0 1 1\nS .\n. G\n").unwrap_err();
            assert_eq!(err.line, 4);
            assert_eq!(err.reason, MalformedReason::MissingRow { row: 2 });
        }

        #[test]
        fn short_row() {
            let err = parse("3 2 0 0 1 2\nS . .\n. G\n").unwrap_err();
            assert_eq!(err.line, 3);
            assert_eq!(
                err.reason,
                MalformedReason::ShortRow {
                    row: 1,
                    found: 2,
                    expected: 3
                }
            );
        }
    }

    mod write {
        use crate::{default_maze, parse};

        #[test]
        fn reparses() {
            let maze = default_maze();
            assert_eq!(parse(&maze.to_string()), Ok(maze));
        }

        #[test]
        fn header_is_row_major() {
            let text = default_maze().to_string();
            assert_eq!(text.lines().next(), Some("12 10 1 1 8 10"));
            assert_eq!(text.lines().count(), 11);
        }
    }
}
