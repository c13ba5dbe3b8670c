use serde_json::{Value, json};

use crate::{
    domain::{DynamicFlowField, FieldOption},
    form::{FetchTarget, FlowMachine, FlowSelectOutcome, ValueScope, flow::missing_required},
};

fn vehicle_flow() -> DynamicFlowField {
    serde_json::from_value(json!({
        "name": "vehicle",
        "type": "dynamic-flow",
        "outputStepId": "model",
        "flow": [
            {
                "id": "make",
                "label": "Make",
                "optionsSource": {"function": "getMakes"},
                "validation": {"required": {"value": true}}
            },
            {
                "id": "series",
                "label": "Series",
                "optionsSource": {"function": "getSeries", "dependsOn": "make", "params": ["region"]}
            },
            {
                "id": "model",
                "label": "Model",
                "optionsSource": {"function": "getModels", "dependsOn": "series"}
            }
        ]
    }))
    .expect("flow field")
}

fn applied(outcome: FlowSelectOutcome) -> crate::form::FlowChange {
    match outcome {
        FlowSelectOutcome::Applied(change) => change,
        other => panic!("expected an applied selection, got {other:?}"),
    }
}

#[test]
fn initialize_fetches_only_the_independent_first_step() {
    let field = vehicle_flow();
    let data = json!({});
    let machine = FlowMachine::new(&field, "vehicle");
    let (state, tickets) = machine.initialize(&ValueScope::global(&data));

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].function, "getMakes");
    assert_eq!(
        tickets[0].target,
        FetchTarget::FlowStep {
            field: "vehicle".into(),
            step: "make".into()
        }
    );
    assert!(state.step("make").expect("make").is_loading());
    assert!(machine.is_step_enabled(&state, 0));
    assert!(!machine.is_step_enabled(&state, 1));
}

#[test]
fn changing_an_early_step_resets_later_steps_and_fetches_dependents_only() {
    let field = vehicle_flow();
    let data = json!({"region": "eu"});
    let scope = ValueScope::global(&data);
    let machine = FlowMachine::new(&field, "vehicle");
    let (mut state, _) = machine.initialize(&scope);

    applied(machine.select(&mut state, "make", "A".into(), &scope));
    applied(machine.select(&mut state, "series", "B".into(), &scope));
    let done = applied(machine.select(&mut state, "model", "C".into(), &scope));
    assert_eq!(done.output.as_deref(), Some("C"));
    assert!(machine.is_complete(&state));

    let change = applied(machine.select(&mut state, "make", "A2".into(), &scope));
    assert_eq!(change.reset, vec!["series".to_string(), "model".to_string()]);
    assert_eq!(state.value("series"), "");
    assert_eq!(state.value("model"), "");
    assert!(change.output.is_none());
    assert!(!machine.is_complete(&state));

    assert_eq!(change.tickets.len(), 1, "only the direct dependent refetches");
    let ticket = &change.tickets[0];
    assert_eq!(ticket.function, "getSeries");
    assert_eq!(ticket.args, vec![json!("A2"), json!("eu")]);
}

#[test]
fn locked_and_unknown_steps_are_rejected() {
    let field = vehicle_flow();
    let data = json!({});
    let scope = ValueScope::global(&data);
    let machine = FlowMachine::new(&field, "vehicle");
    let (mut state, _) = machine.initialize(&scope);

    assert_eq!(
        machine.select(&mut state, "model", "C".into(), &scope),
        FlowSelectOutcome::Locked
    );
    assert_eq!(
        machine.select(&mut state, "trim", "X".into(), &scope),
        FlowSelectOutcome::UnknownStep
    );
    assert_eq!(state.value("model"), "");
}

#[test]
fn clearing_a_step_fetches_nothing() {
    let field = vehicle_flow();
    let data = json!({});
    let scope = ValueScope::global(&data);
    let machine = FlowMachine::new(&field, "vehicle");
    let (mut state, _) = machine.initialize(&scope);

    applied(machine.select(&mut state, "make", "A".into(), &scope));
    let change = applied(machine.select(&mut state, "make", String::new(), &scope));
    assert!(change.tickets.is_empty());
    assert!(!machine.is_step_enabled(&state, 1));
}

#[test]
fn stale_step_results_are_discarded_after_a_reset() {
    let field = vehicle_flow();
    let data = json!({});
    let scope = ValueScope::global(&data);
    let machine = FlowMachine::new(&field, "vehicle");
    let (mut state, _) = machine.initialize(&scope);

    let first = applied(machine.select(&mut state, "make", "A".into(), &scope));
    let second = applied(machine.select(&mut state, "make", "B".into(), &scope));
    let series = state.step_mut("series").expect("series");
    assert!(
        !series
            .slot
            .complete(&first.tickets[0], Ok(vec![FieldOption::new("a1", "A1")]))
    );
    assert!(
        series
            .slot
            .complete(&second.tickets[0], Ok(vec![FieldOption::new("b1", "B1")]))
    );
    assert_eq!(series.options(), &[FieldOption::new("b1", "B1")][..]);
}

#[test]
fn missing_required_lists_step_messages() {
    let field = vehicle_flow();
    let data = Value::Null;
    let machine = FlowMachine::new(&field, "vehicle");
    let (state, _) = machine.initialize(&ValueScope::global(&data));
    assert_eq!(
        missing_required(&field, Some(&state)),
        vec![("make".to_string(), "Make is required".to_string())]
    );
    assert_eq!(missing_required(&field, None).len(), 1);
}
