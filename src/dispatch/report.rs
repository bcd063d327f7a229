//! Command results and their text rendering
//!
//! A [`Report`] is the typed outcome of a command. Its `Display` implementation is
//! the line-oriented text the caller reads verbatim. The block table is laid out so
//! that every data row splits into exactly five whitespace-separated tokens
//! (`pid start end size status`) with a numeric first token, while header, separator
//! and placeholder lines never start with a number.

use crate::memory::{Block, HeapStats, Pid, Relation};
use std::fmt;

const TABLE_RULE_WIDTH: usize = 48;

/// Outcome of a successful command
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Allocated {
        block: Block,
        blocks: Vec<Block>, // Table after the allocation, ordered by pid
    },
    Deallocated {
        block: Block,
        blocks: Vec<Block>,
    },
    Compacted {
        moved: usize,
        blocks: Vec<Block>, // Ordered by pid
    },
    RelationAdded {
        from: Pid,
        to: Pid,
        inserted: bool,
    },
    Graph(Vec<Relation>),
    Table(Vec<Block>),
    Stats(HeapStats),
    LoggedOut,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Allocated { block, blocks } => {
                writeln!(
                    f,
                    "pid={} start={} end={}",
                    block.pid(),
                    block.start(),
                    block.end()
                )?;
                write_table(f, blocks)
            }
            Report::Deallocated { block, blocks } => {
                writeln!(
                    f,
                    "Deallocated pid {} ({} units at [{}, {}))",
                    block.pid(),
                    block.size(),
                    block.start(),
                    block.end()
                )?;
                write_table(f, blocks)
            }
            Report::Compacted { moved, blocks } => {
                writeln!(
                    f,
                    "Memory compacted ({} block{} moved)",
                    moved,
                    if *moved == 1 { "" } else { "s" }
                )?;
                write_table(f, blocks)
            }
            Report::RelationAdded { from, to, inserted } => {
                if *inserted {
                    writeln!(f, "Added relation {} -> {}", from, to)
                } else {
                    writeln!(f, "Relation {} -> {} already present", from, to)
                }
            }
            Report::Graph(edges) => {
                if edges.is_empty() {
                    return writeln!(f, "No relations");
                }
                for edge in edges {
                    writeln!(f, "{}", edge)?;
                }
                Ok(())
            }
            Report::Table(blocks) => write_table(f, blocks),
            Report::Stats(stats) => write_stats(f, stats),
            Report::LoggedOut => writeln!(f, "Session cleared"),
        }
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, blocks: &[Block]) -> fmt::Result {
    let rule = "-".repeat(TABLE_RULE_WIDTH);
    writeln!(f, "{}", rule)?;
    writeln!(
        f,
        "{:<8}{:<10}{:<10}{:<10}{}",
        "PID", "START", "END", "SIZE", "STATUS"
    )?;
    writeln!(f, "{}", rule)?;

    if blocks.is_empty() {
        writeln!(f, "(no allocated blocks)")?;
    }
    for block in blocks {
        // Columns are padded but always separated by at least one space
        writeln!(
            f,
            "{:<7} {:<9} {:<9} {:<9} {}",
            block.pid(),
            block.start(),
            block.end(),
            block.size(),
            block.status()
        )?;
    }

    writeln!(f, "{}", rule)
}

fn write_stats(f: &mut fmt::Formatter<'_>, stats: &HeapStats) -> fmt::Result {
    writeln!(f, "Capacity:       {}", stats.capacity)?;
    writeln!(f, "Used:           {}", stats.used)?;
    writeln!(f, "Free:           {}", stats.free)?;
    writeln!(f, "Blocks:         {}", stats.allocated_blocks)?;
    writeln!(f, "Free ranges:    {}", stats.free_ranges)?;
    writeln!(f, "Largest free:   {}", stats.largest_free)?;
    writeln!(f, "Fragmentation:  {:.1}%", stats.fragmentation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{HeapState, PidPolicy};

    fn sample_heap() -> HeapState {
        let mut heap = HeapState::new(100_000);
        heap.allocate(30, PidPolicy::ReuseLowest).unwrap();
        heap.allocate(12_345, PidPolicy::ReuseLowest).unwrap();
        heap.allocate(20, PidPolicy::ReuseLowest).unwrap();
        heap.deallocate(1).unwrap();
        heap
    }

    #[test]
    fn test_table_rows_have_five_tokens() {
        let text = Report::Table(sample_heap().blocks_by_pid()).to_string();

        let rows: Vec<Vec<&str>> = text
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .filter(|parts| parts.len() == 5 && parts[0].chars().all(|c| c.is_ascii_digit()))
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["2", "30", "12375", "12345", "ALLOCATED"]);
        assert_eq!(rows[1], vec!["3", "12375", "12395", "20", "ALLOCATED"]);
    }

    #[test]
    fn test_non_data_lines_never_start_with_a_digit() {
        for report in [Report::Table(Vec::new()), Report::Table(sample_heap().blocks_by_pid())] {
            let text = report.to_string();
            let data_rows = text
                .lines()
                .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
                .count();
            let expected = match &report {
                Report::Table(blocks) => blocks.len(),
                _ => unreachable!(),
            };
            assert_eq!(data_rows, expected);
        }
    }

    #[test]
    fn test_graph_lines() {
        let report = Report::Graph(vec![
            Relation { from: 1, to: 2 },
            Relation { from: 3, to: 5 },
        ]);
        assert_eq!(report.to_string(), "1 -> 2\n3 -> 5\n");
        assert_eq!(Report::Graph(Vec::new()).to_string(), "No relations\n");
    }

    #[test]
    fn test_allocated_line() {
        let mut heap = HeapState::new(100);
        let block = heap.allocate(30, PidPolicy::ReuseLowest).unwrap();
        let text = Report::Allocated {
            block,
            blocks: heap.blocks_by_pid(),
        }
        .to_string();

        assert!(text.starts_with("pid=1 start=0 end=30\n"));
        assert!(text.contains("\n1       0         30        30        ALLOCATED\n"));
    }

    #[test]
    fn test_deallocated_shows_remaining_blocks() {
        let mut heap = sample_heap();
        let block = heap.deallocate(2).unwrap();
        let text = Report::Deallocated {
            block,
            blocks: heap.blocks_by_pid(),
        }
        .to_string();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Deallocated pid 2 (12345 units at [30, 12375))")
        );
        let data_rows: Vec<&str> = lines
            .filter(|line| line.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(data_rows.len(), 1);
        assert!(data_rows[0].starts_with("3 "));
    }

    #[test]
    fn test_compacted_includes_table() {
        let mut heap = sample_heap();
        let moved = heap.compact();
        let text = Report::Compacted {
            moved,
            blocks: heap.blocks_by_pid(),
        }
        .to_string();

        assert!(text.starts_with("Memory compacted (2 blocks moved)\n"));
        assert!(text.contains("ALLOCATED"));
    }

    #[test]
    fn test_relation_messages() {
        let added = Report::RelationAdded {
            from: 3,
            to: 5,
            inserted: true,
        };
        let repeated = Report::RelationAdded {
            from: 3,
            to: 5,
            inserted: false,
        };
        assert_eq!(added.to_string(), "Added relation 3 -> 5\n");
        assert_eq!(repeated.to_string(), "Relation 3 -> 5 already present\n");
    }
}
