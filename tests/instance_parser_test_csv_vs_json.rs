use std::path::Path;

use subgradient_bound::instance_parser::parse_problem;
mod common;
use common::*;

#[test]
fn test_csv_vs_json() {
    let from_json = parse_problem(Path::new("data/test/reference.json")).unwrap();
    let from_csv = parse_problem(Path::new("data/test/reference_csv")).unwrap();
    assert_eq!(from_json, from_csv);
    assert_eq!(from_json, reference_problem());
}
