//! Derived-field evaluator
//!
//! Recomputes every derived field from the current values of the other
//! fields. Runs over all derived fields on each change, in declaration order,
//! so a derived field sees the fresh value of any derived field declared
//! before it. Failing formulas leave the stored value alone.

use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::FormField;
use crate::domain::services::formula::{self, FormulaError};
use crate::domain::value_objects::{FieldValue, FormValues};

/// Outcome of one recompute pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecomputeReport {
    /// Derived fields whose stored value changed
    pub updated: Vec<String>,
    /// Derived fields whose formula could not be evaluated
    pub failed: Vec<(String, FormulaError)>,
}

impl RecomputeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct DerivedFieldEvaluator;

impl DerivedFieldEvaluator {
    /// Recompute all derived fields in place.
    pub fn recompute(fields: &[FormField], values: &mut FormValues) -> RecomputeReport {
        let mut report = RecomputeReport::default();

        for derived in fields.iter().filter(|f| f.has_formula()) {
            let bindings = Self::bindings_for(derived, fields, values);

            match formula::evaluate(&derived.derived_formula, &bindings) {
                Ok(result) => {
                    let text = FieldValue::Text(formula::format_number(result));
                    if values.get(&derived.id) != Some(&text) {
                        values.insert(derived.id.clone(), text);
                        report.updated.push(derived.id.clone());
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        field_id = %derived.id,
                        formula = %derived.derived_formula,
                        error = %e,
                        "Derived formula not evaluated"
                    );
                    report.failed.push((derived.id.clone(), e));
                }
            }
        }

        report
    }

    /// Label bindings seen by `derived`: every other field, in declaration order.
    pub fn bindings_for(
        derived: &FormField,
        fields: &[FormField],
        values: &FormValues,
    ) -> Vec<(String, f64)> {
        fields
            .iter()
            .filter(|f| f.id != derived.id)
            .map(|f| {
                let number = values.get(&f.id).map(FieldValue::as_number).unwrap_or(0.0);
                (f.label.clone(), number)
            })
            .collect()
    }

    /// Groups of derived fields whose formulas reference each other.
    ///
    /// Cycles are not broken during evaluation; each field in a cycle reads
    /// the value stored by the previous pass. This is for diagnostics.
    pub fn find_cycles(fields: &[FormField]) -> Vec<Vec<String>> {
        let edges: HashMap<&str, Vec<&str>> = fields
            .iter()
            .filter(|f| f.has_formula())
            .map(|derived| {
                let deps = fields
                    .iter()
                    .filter(|f| f.id != derived.id && f.has_formula())
                    .filter(|f| !f.label.is_empty() && derived.derived_formula.contains(f.label.as_str()))
                    .map(|f| f.id.as_str())
                    .collect();
                (derived.id.as_str(), deps)
            })
            .collect();

        let mut cycles = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();

        for start in fields.iter().filter(|f| f.has_formula()).map(|f| f.id.as_str()) {
            let mut path: Vec<&str> = Vec::new();
            Self::visit(start, &edges, &mut path, &mut done, &mut cycles);
        }

        cycles
    }

    fn visit<'f>(
        node: &'f str,
        edges: &HashMap<&'f str, Vec<&'f str>>,
        path: &mut Vec<&'f str>,
        done: &mut HashSet<&'f str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        if let Some(pos) = path.iter().position(|n| *n == node) {
            cycles.push(path[pos..].iter().map(|s| s.to_string()).collect());
            return;
        }
        if done.contains(node) {
            return;
        }

        path.push(node);
        for next in edges.get(node).into_iter().flatten() {
            Self::visit(*next, edges, path, done, cycles);
        }
        path.pop();
        done.insert(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::FieldType;

    fn number(label: &str) -> FormField {
        FormField::new(FieldType::Number, label)
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::text(value)
    }

    #[test]
    fn test_sum_of_two_fields() {
        let a = number("A");
        let b = number("B");
        let c = FormField::derived("C", "A + B");
        let fields = vec![a.clone(), b.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("3"));
        values.insert(b.id.clone(), text("4"));

        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("7"));
        assert_eq!(report.updated, vec![c.id.clone()]);
        assert!(report.is_clean());

        // Nothing changed, nothing reported
        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert!(report.updated.is_empty());
    }

    #[test]
    fn test_self_reference_never_binds() {
        let a = number("A");
        let c = FormField::derived("C", "A + C");
        let fields = vec![a.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("2"));
        values.insert(c.id.clone(), text("40"));

        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("40"));
        assert_eq!(report.failed.len(), 1);

        let bindings = DerivedFieldEvaluator::bindings_for(&c, &fields, &values);
        assert!(bindings.iter().all(|(label, _)| label != "C"));
    }

    #[test]
    fn test_unsafe_formula_keeps_prior_value() {
        let a = number("A");
        let c = FormField::derived("C", "A; alert(1)");
        let fields = vec![a.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("1"));
        values.insert(c.id.clone(), text("prior"));

        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("prior"));
        assert!(matches!(
            report.failed[0].1,
            FormulaError::UnexpectedCharacter { ch: ';', .. }
        ));
    }

    #[test]
    fn test_non_numeric_inputs_count_as_zero() {
        let a = number("A");
        let b = FormField::new(FieldType::Checkbox, "B");
        let n = number("N");
        let c = FormField::derived("C", "A + B + N + 1");
        let fields = vec![a.clone(), b.clone(), n.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("abc"));
        values.insert(b.id.clone(), FieldValue::Multi(vec!["5".into()]));

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("1"));
    }

    #[test]
    fn test_metacharacter_labels() {
        let dotted = number("a.b");
        let call = number("x(y)");
        let c = FormField::derived("C", "a.b * x(y)");
        let fields = vec![dotted.clone(), call.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(dotted.id.clone(), text("1.5"));
        values.insert(call.id.clone(), text("4"));

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("6"));
    }

    #[test]
    fn test_chain_in_declaration_order() {
        let a = number("A");
        let double = FormField::derived("Double", "A * 2");
        let quad = FormField::derived("Quad", "Double * 2");
        let fields = vec![a.clone(), double.clone(), quad.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("5"));

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&double.id], text("10"));
        assert_eq!(values[&quad.id], text("20"));
    }

    #[test]
    fn test_division_by_zero_stored_as_text() {
        let a = number("A");
        let c = FormField::derived("C", "1 / A");
        let fields = vec![a.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("0"));

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("Infinity"));
    }

    #[test]
    fn test_overlapping_labels_follow_declaration_order() {
        let b = number("B");
        let ab = number("AB");
        let c = FormField::derived("C", "AB + 1");
        let fields = vec![b.clone(), ab.clone(), c.clone()];

        let mut values = FormValues::new();
        values.insert(b.id.clone(), text("4"));
        values.insert(ab.id.clone(), text("10"));
        values.insert(c.id.clone(), text("prior"));

        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("prior"));
        assert!(matches!(
            report.failed[0].1,
            FormulaError::UnexpectedCharacter { ch: 'A', position: 0 }
        ));

        // Declared the other way round, "AB" claims its text first
        let fields = vec![ab.clone(), b.clone(), c.clone()];
        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("11"));
    }

    #[test]
    fn test_infinite_result_does_not_feed_later_formulas() {
        let a = number("A");
        let c = FormField::derived("C", "1 / A");
        let d = FormField::derived("D", "C + 1");
        let fields = vec![a.clone(), c.clone(), d.clone()];

        let mut values = FormValues::new();
        values.insert(a.id.clone(), text("0"));
        values.insert(d.id.clone(), text("prior"));

        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&c.id], text("Infinity"));
        assert_eq!(values[&d.id], text("prior"));
        assert_eq!(report.updated, vec![c.id.clone()]);
        assert!(matches!(
            &report.failed[0],
            (id, FormulaError::NonDecimalValue { label, .. }) if *id == d.id && label == "C"
        ));
    }

    #[test]
    fn test_blank_or_disabled_formulas_skipped() {
        let mut off = FormField::derived("Off", "1 + 1");
        off.is_derived = false;
        let blank = FormField::derived("Blank", "   ");
        let fields = vec![off.clone(), blank.clone()];

        let mut values = FormValues::new();
        let report = DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert!(values.is_empty());
        assert_eq!(report, RecomputeReport::default());
    }

    #[test]
    fn test_find_cycles() {
        let a = FormField::derived("P", "Q + 1");
        let b = FormField::derived("Q", "P + 1");
        let c = FormField::derived("R", "P * 2");
        let fields = vec![a.clone(), b.clone(), c.clone()];

        let cycles = DerivedFieldEvaluator::find_cycles(&fields);
        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].clone();
        members.sort();
        let mut expected = vec![a.id.clone(), b.id.clone()];
        expected.sort();
        assert_eq!(members, expected);

        let acyclic = vec![number("A"), FormField::derived("S", "A + 1")];
        assert!(DerivedFieldEvaluator::find_cycles(&acyclic).is_empty());
    }

    #[test]
    fn test_cycle_reads_previous_pass() {
        let a = FormField::derived("P", "Q + 1");
        let b = FormField::derived("Q", "P + 1");
        let fields = vec![a.clone(), b.clone()];
        let mut values = FormValues::new();

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&a.id], text("1"));
        assert_eq!(values[&b.id], text("2"));

        DerivedFieldEvaluator::recompute(&fields, &mut values);
        assert_eq!(values[&a.id], text("3"));
        assert_eq!(values[&b.id], text("4"));
    }
}
