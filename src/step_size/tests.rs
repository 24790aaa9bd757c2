use super::StepSize;
use crate::error::BoundError;

#[test]
fn test_schedule_values() {
    let harmonic = StepSize::Harmonic { initial: 2.0 };
    assert_eq!(harmonic.at(1), Some(2.0));
    assert_eq!(harmonic.at(4), Some(0.5));
    let inverse_sqrt = StepSize::InverseSqrt { initial: 3.0 };
    assert_eq!(inverse_sqrt.at(9), Some(1.0));
    let constant = StepSize::Constant { value: 0.25 };
    assert_eq!(constant.at(1), constant.at(1000));
    let sequence = StepSize::Sequence {
        values: vec![1.0, 0.5, 0.5],
    };
    assert_eq!(sequence.at(2), Some(0.5));
}

#[test]
fn test_out_of_range_steps() {
    let single = StepSize::Sequence { values: vec![1.0] };
    assert_eq!(single.at(1), Some(1.0));
    assert_eq!(single.at(2), None);
    let empty = StepSize::Sequence { values: vec![] };
    assert!(empty.validate(0).is_ok());
    assert_eq!(empty.at(0), None);
    assert_eq!(empty.at(1), None);
    assert_eq!(StepSize::default().at(0), None);
}

#[test]
fn test_validate_rejects_non_positive_scale() {
    assert!(matches!(
        StepSize::Constant { value: 0.0 }.validate(10),
        Err(BoundError::InvalidInput { .. })
    ));
    assert!(StepSize::Harmonic { initial: -1.0 }.validate(10).is_err());
    assert!(StepSize::InverseSqrt { initial: f64::NAN }
        .validate(10)
        .is_err());
    assert!(StepSize::default().validate(0).is_ok());
}

#[test]
fn test_validate_sequence() {
    let short = StepSize::Sequence {
        values: vec![1.0, 0.5],
    };
    assert!(short.validate(2).is_ok());
    assert!(short.validate(3).is_err());
    let increasing = StepSize::Sequence {
        values: vec![1.0, 0.5, 0.75],
    };
    assert!(increasing.validate(3).is_err());
    let zero = StepSize::Sequence {
        values: vec![1.0, 0.0],
    };
    assert!(zero.validate(1).is_err());
}

#[test]
fn test_parse() {
    assert_eq!(
        "harmonic:0.5".parse::<StepSize>().unwrap(),
        StepSize::Harmonic { initial: 0.5 }
    );
    assert_eq!(
        "inverse-sqrt".parse::<StepSize>().unwrap(),
        StepSize::InverseSqrt { initial: 1.0 }
    );
    assert_eq!(
        "sequence:1, 0.5,0.25".parse::<StepSize>().unwrap(),
        StepSize::Sequence {
            values: vec![1.0, 0.5, 0.25]
        }
    );
    assert!("polyak:1".parse::<StepSize>().is_err());
    assert!("constant:abc".parse::<StepSize>().is_err());
}

#[test]
fn test_display_parses_back() {
    let schedule = StepSize::Sequence {
        values: vec![2.0, 1.5],
    };
    assert_eq!(schedule.to_string().parse::<StepSize>().unwrap(), schedule);
}

#[test]
fn test_serde_tag() {
    let schedule: StepSize =
        serde_json::from_str(r#"{"kind": "inverse_sqrt", "initial": 2.0}"#)
            .unwrap();
    assert_eq!(schedule, StepSize::InverseSqrt { initial: 2.0 });
}
