use std::collections::HashMap;
use std::fmt;

/// Outcome for one component of a solved problem.
///
/// Correlated with its component by position, name and group only.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultComponent {
    pub name: Option<String>,
    pub group: Option<String>,
    /// Unset until the orchestrator writes the extracted value
    pub optimal_value: Option<f64>,
    pub lower_bound_active: bool,
    pub upper_bound_active: bool,
}

impl ResultComponent {
    pub fn new(name: Option<String>, group: Option<String>) -> Self {
        Self {
            name,
            group,
            ..Default::default()
        }
    }

    fn value(&self) -> f64 {
        self.optimal_value.unwrap_or(f64::NAN)
    }
}

/// Results of a solved problem, one entry per component in registration order.
///
/// List views report unset values as NaN. Keyed views skip unnamed entries;
/// when names repeat, the last entry with a name wins.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizationResult {
    pub decision_variables: Vec<ResultComponent>,
    pub constraints: Vec<ResultComponent>,
    pub objectives: Vec<ResultComponent>,
}

fn select<'a>(
    components: &'a [ResultComponent],
    group: Option<&'a str>,
) -> impl Iterator<Item = &'a ResultComponent> {
    components
        .iter()
        .filter(move |c| group.is_none() || c.group.as_deref() == group)
}

fn listed<T>(
    components: &[ResultComponent],
    group: Option<&str>,
    project: impl Fn(&ResultComponent) -> T,
) -> Vec<T> {
    select(components, group).map(project).collect()
}

fn keyed<T>(
    components: &[ResultComponent],
    group: Option<&str>,
    project: impl Fn(&ResultComponent) -> T,
) -> HashMap<String, T> {
    select(components, group)
        .filter_map(|c| c.name.clone().map(|name| (name, project(c))))
        .collect()
}

impl OptimizationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optimal_decision_variables(&self, group: Option<&str>) -> Vec<f64> {
        listed(&self.decision_variables, group, ResultComponent::value)
    }

    pub fn optimal_decision_variables_by_name(&self, group: Option<&str>) -> HashMap<String, f64> {
        keyed(&self.decision_variables, group, ResultComponent::value)
    }

    pub fn optimal_constraint_values(&self, group: Option<&str>) -> Vec<f64> {
        listed(&self.constraints, group, ResultComponent::value)
    }

    pub fn optimal_constraint_values_by_name(&self, group: Option<&str>) -> HashMap<String, f64> {
        keyed(&self.constraints, group, ResultComponent::value)
    }

    pub fn optimal_objective_values(&self, group: Option<&str>) -> Vec<f64> {
        listed(&self.objectives, group, ResultComponent::value)
    }

    pub fn optimal_objective_values_by_name(&self, group: Option<&str>) -> HashMap<String, f64> {
        keyed(&self.objectives, group, ResultComponent::value)
    }

    /// Sum of the objective values, which is the minimized quantity when no
    /// group filter is given.
    pub fn optimal_objective_sum(&self, group: Option<&str>) -> f64 {
        select(&self.objectives, group).map(ResultComponent::value).sum()
    }

    pub fn active_lower_bounds_constraints(&self, group: Option<&str>) -> Vec<bool> {
        listed(&self.constraints, group, |c| c.lower_bound_active)
    }

    pub fn active_lower_bounds_constraints_by_name(&self, group: Option<&str>) -> HashMap<String, bool> {
        keyed(&self.constraints, group, |c| c.lower_bound_active)
    }

    pub fn active_upper_bounds_constraints(&self, group: Option<&str>) -> Vec<bool> {
        listed(&self.constraints, group, |c| c.upper_bound_active)
    }

    pub fn active_upper_bounds_constraints_by_name(&self, group: Option<&str>) -> HashMap<String, bool> {
        keyed(&self.constraints, group, |c| c.upper_bound_active)
    }

    pub fn active_lower_bounds_decision_variables(&self, group: Option<&str>) -> Vec<bool> {
        listed(&self.decision_variables, group, |c| c.lower_bound_active)
    }

    pub fn active_lower_bounds_decision_variables_by_name(
        &self,
        group: Option<&str>,
    ) -> HashMap<String, bool> {
        keyed(&self.decision_variables, group, |c| c.lower_bound_active)
    }

    pub fn active_upper_bounds_decision_variables(&self, group: Option<&str>) -> Vec<bool> {
        listed(&self.decision_variables, group, |c| c.upper_bound_active)
    }

    pub fn active_upper_bounds_decision_variables_by_name(
        &self,
        group: Option<&str>,
    ) -> HashMap<String, bool> {
        keyed(&self.decision_variables, group, |c| c.upper_bound_active)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, components: &[ResultComponent]) -> fmt::Result {
    writeln!(f, "{title}:")?;
    for c in components {
        write!(f, "  {} = {}", c.name.as_deref().unwrap_or("unnamed"), c.value())?;
        match (c.lower_bound_active, c.upper_bound_active) {
            (true, true) => write!(f, " [both bounds active]")?,
            (true, false) => write!(f, " [lower bound active]")?,
            (false, true) => write!(f, " [upper bound active]")?,
            (false, false) => {}
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "objective sum: {}", self.optimal_objective_sum(None))?;
        write_section(f, "objectives", &self.objectives)?;
        write_section(f, "decision variables", &self.decision_variables)?;
        write_section(f, "constraints", &self.constraints)
    }
}
