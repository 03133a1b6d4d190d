use sql_schema_linter::{
    ast::{Node, NodeKind, lower_statement},
    engine::{Event, TraversalError, events, traverse},
    source::{SqlDialect, split_statements}
};

fn stream(depths: &[usize]) -> Vec<Node> {
    depths
        .iter()
        .enumerate()
        .map(|(i, &depth)| Node::new(NodeKind::Expression, format!("n{}", i), depth))
        .collect()
}

fn trace(nodes: &[Node]) -> Vec<String> {
    events(nodes)
        .unwrap()
        .iter()
        .map(|(key, node)| format!("{}:{}", key.event.suffix(), node.name))
        .collect()
}

#[test]
fn test_documented_depth_sequence() {
    let nodes = stream(&[0, 1, 2, 1, 0]);
    assert_eq!(
        trace(&nodes),
        vec![
            "visit:n0", "visit:n1", "visit:n2", "leave:n2", "leave:n1", "visit:n3", "leave:n3",
            "leave:n0", "visit:n4", "leave:n4",
        ]
    );
}

#[test]
fn test_every_node_is_visited_and_left_once() {
    let sequences: &[&[usize]] = &[
        &[0],
        &[0, 1, 1, 1],
        &[0, 1, 2, 3, 1, 2, 2, 0, 1],
        &[0, 1, 2, 3, 4, 0],
        &[2, 1, 0]
    ];
    for depths in sequences {
        let nodes = stream(depths);
        let events = events(&nodes).unwrap();
        for node in &nodes {
            let visits = events
                .iter()
                .filter(|(k, n)| k.event == Event::Visit && n.name == node.name)
                .count();
            let leaves = events
                .iter()
                .filter(|(k, n)| k.event == Event::Leave && n.name == node.name)
                .count();
            assert_eq!((visits, leaves), (1, 1), "node {} in {:?}", node.name, depths);
        }
    }
}

#[test]
fn test_leave_follows_descendants_and_precedes_shallower_siblings() {
    let nodes = stream(&[0, 1, 2, 3, 1, 2, 0]);
    let trace = trace(&nodes);
    let pos = |label: &str| trace.iter().position(|e| e == label).unwrap();

    assert!(pos("leave:n3") < pos("leave:n2"));
    assert!(pos("leave:n2") < pos("leave:n1"));
    assert!(pos("leave:n1") < pos("visit:n4"));
    assert!(pos("leave:n5") < pos("leave:n4"));
    assert!(pos("leave:n4") < pos("leave:n0"));
    assert!(pos("leave:n0") < pos("visit:n6"));
}

#[test]
fn test_skipped_level_is_fatal() {
    let nodes = stream(&[0, 3, 4, 1]);
    let mut seen = Vec::new();
    let err = traverse(&nodes, |key, node| seen.push((key, node.name.clone()))).unwrap_err();

    let TraversalError::DepthGap {
        depth, open_depth, ..
    } = err;
    assert_eq!((depth, open_depth), (1, 0));
    assert!(
        seen.iter()
            .all(|(_, name)| name.as_str() != "n3"),
        "no events after the gap"
    );
}

#[test]
fn test_callback_keys_use_lowercase_node_type() {
    let nodes = vec![
        Node::new(NodeKind::Select, "", 0),
        Node::new(NodeKind::From, "", 1),
        Node::new(NodeKind::Table, "t1", 2),
    ];
    let keys: Vec<String> = events(&nodes)
        .unwrap()
        .iter()
        .map(|(k, _)| k.to_string())
        .collect();
    assert_eq!(
        keys,
        vec![
            "select_visit",
            "from_visit",
            "table_visit",
            "table_leave",
            "from_leave",
            "select_leave"
        ]
    );
}

#[test]
fn test_lowered_statements_are_balanced() {
    let sql = "
        CREATE TABLE t1 (id INT PRIMARY KEY, name VARCHAR(20) NOT NULL);
        SELECT a.id, (SELECT COUNT(*) FROM t1 b WHERE b.id = a.id) FROM t1 a WHERE a.name IN ('x', 'y');
        WITH c AS (SELECT id FROM t1) SELECT id FROM c UNION SELECT id FROM t1;
        ALTER TABLE t1 ADD COLUMN age INT, DROP COLUMN name;
        UPDATE t1 SET name = 'z' WHERE id = 1;
    ";
    let dialect = SqlDialect::Generic.into_parser_dialect();
    for statement in split_statements(sql) {
        let parsed = statement.parse(dialect.as_ref()).unwrap();
        let tree = lower_statement(&parsed);
        let events = events(&tree.nodes).unwrap();
        assert_eq!(events.len(), tree.nodes.len() * 2, "{}", statement.text);
        assert_eq!(events.first().map(|(k, _)| k.event), Some(Event::Visit));
        assert_eq!(events.last().map(|(_, n)| n.depth), Some(0));
    }
}
