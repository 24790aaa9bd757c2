use itertools::Itertools;
use ndarray::Array2;
use serde::Serialize;

use crate::datastructures::TransportationProblem;

/// Shipments below this are treated as zero when settling supply and demand.
const QUANTITY_EPSILON: f64 = 1e-9;

/// A shipment plan that covers every demand without exceeding any supply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasiblePlan {
    /// Heuristic that built the plan.
    pub name: String,
    /// Units shipped per source and destination.
    #[serde(skip)]
    pub shipments: Array2<f64>,
    /// Total shipping cost.
    pub cost: f64,
}

impl FeasiblePlan {
    fn from_shipments(
        name: &str,
        problem: &TransportationProblem,
        shipments: Array2<f64>,
    ) -> Self {
        let cost = (&shipments * &problem.costs()).sum();
        Self {
            name: name.to_string(),
            shipments,
            cost,
        }
    }
}

/// Fills cells row by row, starting in the top-left corner.
pub fn north_west_corner(
    problem: &TransportationProblem,
) -> Option<FeasiblePlan> {
    if !problem.is_balanced_or_surplus() {
        return None;
    }
    let cells = (0..problem.num_sources())
        .cartesian_product(0..problem.num_destinations())
        .collect_vec();
    Some(FeasiblePlan::from_shipments(
        "north_west_corner",
        problem,
        allocate_in_order(problem, &cells),
    ))
}

/// Fills the cheapest remaining cell first.
pub fn least_cost(problem: &TransportationProblem) -> Option<FeasiblePlan> {
    if !problem.is_balanced_or_surplus() {
        return None;
    }
    let costs = problem.costs();
    let cells = (0..problem.num_sources())
        .cartesian_product(0..problem.num_destinations())
        .sorted_by(|a, b| costs[*a].total_cmp(&costs[*b]))
        .collect_vec();
    Some(FeasiblePlan::from_shipments(
        "least_cost",
        problem,
        allocate_in_order(problem, &cells),
    ))
}

/// The cheaper of [`north_west_corner`] and [`least_cost`].
pub fn best_feasible_plan(
    problem: &TransportationProblem,
) -> Option<FeasiblePlan> {
    [north_west_corner(problem), least_cost(problem)]
        .into_iter()
        .flatten()
        .min_by(|a, b| a.cost.total_cmp(&b.cost))
}

/// Relative gap between a feasible cost and a lower bound, or the absolute
/// gap if the feasible cost is zero.
pub fn duality_gap(upper: f64, lower: f64) -> f64 {
    let gap = upper - lower;
    if upper.abs() <= QUANTITY_EPSILON {
        gap
    } else {
        gap / upper.abs()
    }
}

fn allocate_in_order(
    problem: &TransportationProblem,
    cells: &[(usize, usize)],
) -> Array2<f64> {
    let mut remaining_supply = problem.supply().to_owned();
    let mut remaining_demand = problem.demand().to_owned();
    let mut shipments = Array2::zeros(problem.costs().dim());
    for &(i, j) in cells {
        let amount = remaining_supply[i].min(remaining_demand[j]);
        if amount > QUANTITY_EPSILON {
            shipments[(i, j)] = amount;
            remaining_supply[i] -= amount;
            remaining_demand[j] -= amount;
        }
    }
    shipments
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;
    use crate::test_utils::reference_problem;

    #[test]
    fn test_north_west_corner() {
        let plan = north_west_corner(&reference_problem()).unwrap();
        assert_eq!(plan.shipments, arr2(&[[10.0, 0.0], [2.0, 13.0]]));
        assert_eq!(plan.cost, 89.0);
    }

    #[test]
    fn test_least_cost() {
        let problem = TransportationProblem::from_rows(
            vec![vec![10.0, 20.0, 30.0], vec![40.0, 50.0, 60.0], vec![70.0, 80.0, 90.0]],
            vec![100.0, 150.0, 200.0],
            vec![120.0, 130.0, 200.0],
        )
        .unwrap();
        let plan = least_cost(&problem).unwrap();
        assert_eq!(plan.shipments.sum_axis(ndarray::Axis(0)).to_vec(), vec![120.0, 130.0, 200.0]);
        assert!(plan.shipments.sum_axis(ndarray::Axis(1)).to_vec()
            .iter()
            .zip(problem.supply().iter())
            .all(|(shipped, supply)| shipped <= supply));
        let best = best_feasible_plan(&problem).unwrap();
        assert!(best.cost <= plan.cost);
    }

    #[test]
    fn test_infeasible() {
        let problem = TransportationProblem::from_rows(
            vec![vec![1.0, 1.0]],
            vec![1.0],
            vec![1.0, 1.0],
        )
        .unwrap();
        assert!(best_feasible_plan(&problem).is_none());
    }

    #[test]
    fn test_duality_gap() {
        assert_eq!(duality_gap(100.0, 90.0), 0.1);
        assert_eq!(duality_gap(0.0, -2.0), 2.0);
    }
}
