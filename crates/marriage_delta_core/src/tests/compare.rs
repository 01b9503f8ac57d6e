//! Tests for the married versus separate comparison

use super::mock::{MockEngine, sample_incomes, shaped, toy_categories, unavailable};
use crate::categories::CategorySet;
use crate::compare::{ComparisonRow, MarriageOutcome, Section, compare, delta_percent};
use crate::engine::EngineValue;
use crate::error::{EvaluationError, ScenarioError};
use crate::evaluate::Evaluator;
use crate::model::{Category, HouseholdMetric, Household, StateCode};

fn household(state: &str, head: i64, spouse: i64) -> Household {
    Household::new(StateCode::new(state).unwrap(), head, spouse, 2024)
}

/// Engine whose married net income is fixed and each single filer nets 40,000
fn fixed_net_engine(married_net: f64) -> MockEngine {
    MockEngine::new(move |scenario, variable| match variable {
        "household_net_income" if scenario.people.len() == 2 => {
            Ok(EngineValue::Scalar(married_net))
        }
        "household_net_income" => Ok(EngineValue::Scalar(40_000.0)),
        _ => Ok(EngineValue::Scalar(0.0)),
    })
}

#[test]
fn test_separate_is_sum_of_single_filers() {
    let engine = MockEngine::toy();
    let categories = toy_categories();
    let evaluator = Evaluator::new(&engine, &categories);
    let household = household("CA", 30_000, 20_000)
        .with_child(1, 4)
        .with_child(2, 9);

    let result = compare(&evaluator, &household).unwrap();

    for metric in HouseholdMetric::ALL {
        assert_eq!(
            result.separate.metric(metric),
            result.head_alone.metric(metric) + result.spouse_alone.metric(metric),
            "{}",
            metric.label()
        );
        assert_eq!(
            result.delta(metric),
            result.married.metric(metric) - result.separate.metric(metric)
        );
    }
    for category in Category::ALL {
        let separate = result.separate.breakdown(category);
        for entry in result.head_alone.breakdown(category).iter() {
            let spouse = result.spouse_alone.breakdown(category).get(&entry.program);
            assert_eq!(
                separate.get(&entry.program),
                Some(entry.amount + spouse.unwrap_or(0))
            );
        }
    }
    assert_eq!(engine.loads(), 3);
}

#[test]
fn test_children_are_claimed_by_head() {
    let engine = MockEngine::toy();
    let categories = toy_categories();
    let evaluator = Evaluator::new(&engine, &categories);
    let household = household("CA", 30_000, 20_000)
        .with_child(1, 4)
        .with_child(2, 9);

    let result = compare(&evaluator, &household).unwrap();

    assert_eq!(result.head_alone.credits.get("refundable_ctc"), Some(4_000));
    assert_eq!(result.spouse_alone.credits.get("refundable_ctc"), Some(0));
    assert_eq!(result.separate.credits.get("refundable_ctc"), Some(4_000));
}

#[test]
fn test_zero_income_spouse_matches_head_alone() {
    // Net income proportional to earnings, no other programs modelled
    let engine = MockEngine::new(|scenario, variable| {
        if variable != "household_net_income" {
            return Err(unavailable(variable));
        }
        let earnings: f64 = sample_incomes(scenario)[0].iter().sum();
        Ok(shaped(scenario, vec![0.8 * earnings]))
    });
    let categories = CategorySet::default();
    let evaluator = Evaluator::new(&engine, &categories);

    let err = compare(&evaluator, &household("CA", 50_000, 0)).unwrap_err();
    // Aggregates are never downgraded
    assert!(matches!(err, EvaluationError::EngineUnavailable(_)));

    let engine = MockEngine::new(|scenario, variable| {
        let earnings: f64 = sample_incomes(scenario)[0].iter().sum();
        let value = if variable == "household_net_income" {
            0.8 * earnings
        } else {
            0.0
        };
        Ok(shaped(scenario, vec![value]))
    });
    let evaluator = Evaluator::new(&engine, &categories);

    let result = compare(&evaluator, &household("CA", 50_000, 0)).unwrap();
    assert_eq!(result.spouse_alone.net_income, 0);
    assert_eq!(result.separate, result.head_alone);
    assert_eq!(result.married.net_income, 40_000);
    assert_eq!(result.delta(HouseholdMetric::NetIncome), 0);
    assert_eq!(result.outcome(), MarriageOutcome::Neutral);
}

#[test]
fn test_outcome_classification() {
    let categories = CategorySet::default();
    let cases = [
        (82_000.0, 2_000, MarriageOutcome::Bonus),
        (78_000.0, -2_000, MarriageOutcome::Penalty),
        (80_000.0, 0, MarriageOutcome::Neutral),
    ];

    for (married_net, delta, outcome) in cases {
        let engine = fixed_net_engine(married_net);
        let evaluator = Evaluator::new(&engine, &categories);

        let result = compare(&evaluator, &household("CA", 40_000, 40_000)).unwrap();
        assert_eq!(result.separate.net_income, 80_000);
        assert_eq!(result.delta(HouseholdMetric::NetIncome), delta);
        assert_eq!(result.outcome(), outcome);
        assert!(
            (result.delta_percent(HouseholdMetric::NetIncome) - delta as f64 / 80_000.0).abs()
                < 1e-12
        );
    }
}

#[test]
fn test_delta_percent_zero_when_separate_is_zero() {
    assert_eq!(delta_percent(500, 0), 0.0);
    assert_eq!(delta_percent(0, 0), 0.0);
    assert!((delta_percent(110, 100) - 0.1).abs() < 1e-12);
    assert!((delta_percent(-50, -100) + 0.5).abs() < 1e-12);

    let row = ComparisonRow::new("snap", 1_200, 0);
    assert_eq!(row.delta, 1_200);
    assert_eq!(row.delta_percent, 0.0);
}

#[test]
fn test_table_omits_zero_category_rows() {
    let engine = MockEngine::toy();
    let categories = toy_categories();
    let evaluator = Evaluator::new(&engine, &categories);
    let household = household("CA", 30_000, 20_000).with_child(1, 4);

    let result = compare(&evaluator, &household).unwrap();
    let table = result.table();

    let summary = table.section(Section::Summary).unwrap();
    let labels: Vec<&str> = summary.rows.iter().map(|r| r.program.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Net Income",
            "Benefits",
            "Refundable Tax Credits",
            "Tax Before Refundable Credits"
        ]
    );
    // Benefits are zero on both sides at these incomes but the summary keeps them
    assert_eq!(summary.rows[1].married, 0);
    assert_eq!(summary.rows[1].separate, 0);

    let benefits = table
        .section(Section::Category(Category::Benefits))
        .unwrap();
    assert!(benefits.rows.is_empty());

    let credits = table
        .section(Section::Category(Category::RefundableCredits))
        .unwrap();
    let programs: Vec<&str> = credits.rows.iter().map(|r| r.program.as_str()).collect();
    assert_eq!(programs, vec!["eitc", "refundable_ctc"]);
    // Marrying phases the head's earned credit out entirely
    assert_eq!(credits.rows[0].married, 0);
    assert_eq!(credits.rows[0].separate, 1_000);
    assert_eq!(credits.rows[0].delta, -1_000);

    let taxes = table
        .section(Section::Category(Category::TaxesBeforeRefundableCredits))
        .unwrap();
    assert!(taxes.rows.iter().all(|r| r.program != "flat_tax"));
    assert_eq!(taxes.rows.len(), 2);

    // Unfiltered rows still carry every program
    assert_eq!(result.category_rows(Category::Benefits).len(), 2);
}

#[test]
fn test_toy_household_sees_penalty() {
    let engine = MockEngine::toy();
    let categories = toy_categories();
    let evaluator = Evaluator::new(&engine, &categories);
    let household = household("CA", 30_000, 20_000).with_child(1, 4);

    let result = compare(&evaluator, &household).unwrap();

    // The lost earned credit dominates; payroll tax is linear and cancels
    let delta = result.delta(HouseholdMetric::NetIncome);
    assert!((-1_002..=-998).contains(&delta), "delta was {delta}");
    assert_eq!(result.outcome(), MarriageOutcome::Penalty);
}

#[test]
fn test_invalid_household_never_reaches_engine() {
    let engine = MockEngine::toy();
    let categories = toy_categories();
    let evaluator = Evaluator::new(&engine, &categories);

    let err = compare(&evaluator, &household("CA", 30_000, -1)).unwrap_err();
    assert!(matches!(
        err,
        EvaluationError::InvalidScenario(ScenarioError::NegativeIncome { .. })
    ));
    assert_eq!(engine.loads(), 0);
}
