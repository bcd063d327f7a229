// Integration tests for command dispatch against an in-memory store

use memsim::config::SimConfig;
use memsim::dispatch::{Command, Dispatcher, Report};
use memsim::errors::SimError;
use memsim::memory::RelationPolicy;
use memsim::store::MemoryStore;

fn dispatcher(capacity: u64) -> Dispatcher<MemoryStore> {
    Dispatcher::new(
        MemoryStore::new(),
        SimConfig::default().with_heap_capacity(capacity),
    )
}

/// Parse and run a command the way the binary does
fn run(d: &mut Dispatcher<MemoryStore>, name: &str, args: &[&str]) -> Result<String, SimError> {
    let command = Command::parse(name, args)?;
    d.execute(command).map(|report| report.to_string())
}

/// First line of a report
fn headline(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// The data rows of a display table: five tokens, numeric first token
fn table_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|tokens| tokens.len() == 5 && tokens[0].chars().all(|c| c.is_ascii_digit()))
        .collect()
}

#[test]
fn test_worked_example() {
    let mut d = dispatcher(100);

    assert_eq!(headline(&run(&mut d, "allocate", &["30"]).unwrap()), "pid=1 start=0 end=30");
    assert_eq!(headline(&run(&mut d, "allocate", &["20"]).unwrap()), "pid=2 start=30 end=50");
    let freed = run(&mut d, "deallocate", &["1"]).unwrap();
    assert_eq!(headline(&freed), "Deallocated pid 1 (30 units at [0, 30))");
    assert_eq!(table_rows(&freed), vec![vec!["2", "30", "50", "20", "ALLOCATED"]]);
    assert_eq!(headline(&run(&mut d, "allocate", &["10"]).unwrap()), "pid=1 start=0 end=10");

    let compacted = run(&mut d, "compact", &[]).unwrap();
    assert!(compacted.starts_with("Memory compacted (1 block moved)"));

    let rows = table_rows(&run(&mut d, "display", &[]).unwrap());
    assert_eq!(
        rows,
        vec![
            vec!["1", "0", "10", "10", "ALLOCATED"],
            vec!["2", "10", "30", "20", "ALLOCATED"],
        ]
    );

    match d.execute(Command::Stats).unwrap() {
        Report::Stats(stats) => {
            assert_eq!(stats.used, 30);
            assert_eq!(stats.free, 70);
            assert_eq!(stats.free_ranges, 1);
            assert_eq!(stats.largest_free, 70);
        }
        other => panic!("unexpected report {:?}", other),
    }
}

#[test]
fn test_display_empty_heap_has_no_rows() {
    let mut d = dispatcher(100);
    let text = run(&mut d, "display", &[]).unwrap();
    assert!(table_rows(&text).is_empty());
    assert!(text.contains("(no allocated blocks)"));
}

#[test]
fn test_relation_to_missing_pid_strict() {
    let mut d = dispatcher(100);
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "allocate", &["10"]).unwrap();

    let err = run(&mut d, "add_relation", &["2", "5"]).unwrap_err();
    assert!(matches!(err, SimError::InvalidRelation { .. }));
    assert_eq!(run(&mut d, "show_graph", &[]).unwrap(), "No relations\n");
}

#[test]
fn test_relation_to_missing_pid_permissive() {
    let config = SimConfig::default()
        .with_heap_capacity(100)
        .with_relation_policy(RelationPolicy::Permissive);
    let mut d = Dispatcher::new(MemoryStore::new(), config);
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "allocate", &["10"]).unwrap();

    assert_eq!(
        run(&mut d, "add_relation", &["2", "5"]).unwrap(),
        "Added relation 2 -> 5\n"
    );
    assert_eq!(run(&mut d, "show_graph", &[]).unwrap(), "2 -> 5\n");
}

#[test]
fn test_relation_is_idempotent() {
    let mut d = dispatcher(100);
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "allocate", &["10"]).unwrap();

    run(&mut d, "add_relation", &["1", "2"]).unwrap();
    assert_eq!(
        run(&mut d, "add_relation", &["1", "2"]).unwrap(),
        "Relation 1 -> 2 already present\n"
    );
    assert_eq!(d.store().graph().unwrap().len(), 1);
}

#[test]
fn test_relations_survive_deallocation() {
    let mut d = dispatcher(100);
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "add_relation", &["1", "2"]).unwrap();
    run(&mut d, "deallocate", &["2"]).unwrap();

    assert_eq!(run(&mut d, "show_graph", &[]).unwrap(), "1 -> 2\n");
}

#[test]
fn test_failures_leave_state_untouched() {
    let mut d = dispatcher(100);
    run(&mut d, "allocate", &["60"]).unwrap();
    let before = d.store().heap().cloned();

    let cases: [(&str, &[&str]); 6] = [
        ("allocate", &["0"]),
        ("allocate", &["-4"]),
        ("allocate", &["50"]),
        ("deallocate", &["9"]),
        ("add_relation", &["1", "1"]),
        ("frobnicate", &[]),
    ];
    for (name, args) in cases {
        assert!(run(&mut d, name, args).is_err(), "{} {:?} should fail", name, args);
    }

    assert_eq!(d.store().heap().cloned(), before);
    assert_eq!(d.store().saves(), 1);
}

#[test]
fn test_error_kinds() {
    let mut d = dispatcher(100);

    assert!(matches!(
        run(&mut d, "allocate", &["abc"]),
        Err(SimError::InvalidSize(_))
    ));
    assert!(matches!(
        run(&mut d, "allocate", &["500"]),
        Err(SimError::OutOfMemory { requested: 500, .. })
    ));
    assert!(matches!(
        run(&mut d, "deallocate", &["3"]),
        Err(SimError::NotFound(3))
    ));
    assert!(matches!(
        run(&mut d, "deallocate", &["x"]),
        Err(SimError::InvalidCommand(_))
    ));
    assert!(matches!(
        run(&mut d, "add_relation", &["a", "2"]),
        Err(SimError::InvalidRelation { .. })
    ));
    assert!(matches!(
        run(&mut d, "allocate", &[]),
        Err(SimError::InvalidCommand(_))
    ));
}

#[test]
fn test_logout_then_fresh_session() {
    let mut d = dispatcher(100);
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "allocate", &["10"]).unwrap();
    run(&mut d, "add_relation", &["1", "2"]).unwrap();

    assert_eq!(run(&mut d, "logout", &[]).unwrap(), "Session cleared\n");
    assert_eq!(run(&mut d, "show_graph", &[]).unwrap(), "No relations\n");
    assert_eq!(headline(&run(&mut d, "allocate", &["5"]).unwrap()), "pid=1 start=0 end=5");
}
