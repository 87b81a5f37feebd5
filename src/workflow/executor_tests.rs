use super::*;
use crate::abstractions::{AgentResult, ScenarioMetrics};
use crate::testing::{
    gated_three_step, mock_executor, registry_with, sample_deal, MockAgentInvoker,
    WorkflowBuilder,
};
use crate::workflow::event::WorkflowEvent;
use crate::workflow::{OnFailure, WorkflowStatus};
use std::sync::Mutex;
use std::time::Duration;

use crate::workflow::StepStatus::{Completed, Failed, Pending, Running, Skipped, Stopped};

fn abc_registry() -> crate::registry::StaticAgentRegistry {
    registry_with(&["a", "b", "c"])
}

#[tokio::test]
async fn test_all_steps_complete_in_order() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "A out")
            .with_success("b", "B out")
            .with_success("c", "C out")
            .with_delay(Duration::from_millis(5))
            .build(),
    );
    let workflow = WorkflowBuilder::new("seq").step("a").step("b").step("c").build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Completed, Completed]);
    assert_eq!(state.workflow_status, WorkflowStatus::Done);
    assert_eq!(state.error, None);
    assert_eq!(mock.invoked_agents(), vec!["a", "b", "c"]);
    assert_eq!(mock.max_concurrent_calls(), 1);
    assert_eq!(state.previous_result_text, "C out");
    assert_eq!(state.result(1).unwrap().text, "B out");
}

#[tokio::test]
async fn test_each_call_starts_after_previous_step_settles() {
    let (executor, _mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = WorkflowBuilder::new("seq").step("a").step("b").step("c").build();
    let mut state = ExecutionState::for_workflow(&workflow);
    let snapshots: Mutex<Vec<Vec<StepStatus>>> = Mutex::new(Vec::new());
    let observer = |update: &RunUpdate| {
        if let WorkflowEvent::StepStatusChanged { to: Running, .. } = update.event {
            snapshots.lock().unwrap().push(update.state.step_statuses.clone());
        }
    };

    executor
        .execute(&workflow, &sample_deal(), &mut state, &observer)
        .await
        .unwrap();

    let snapshots = snapshots.into_inner().unwrap();
    assert_eq!(
        snapshots,
        vec![
            vec![Running, Pending, Pending],
            vec![Completed, Running, Pending],
            vec![Completed, Completed, Running],
        ]
    );
}

#[tokio::test]
async fn test_observer_sees_running_before_terminal_status() {
    let (executor, _mock) = mock_executor(
        registry_with(&["a"]),
        MockAgentInvoker::builder().with_success("a", "done").build(),
    );
    let workflow = WorkflowBuilder::new("one").step("a").build();
    let mut state = ExecutionState::for_workflow(&workflow);
    let events: Mutex<Vec<WorkflowEvent>> = Mutex::new(Vec::new());
    let observer = |update: &RunUpdate| events.lock().unwrap().push(update.event.clone());

    executor
        .execute(&workflow, &sample_deal(), &mut state, &observer)
        .await
        .unwrap();

    let events = events.into_inner().unwrap();
    let names: Vec<&str> = events.iter().map(WorkflowEvent::name).collect();
    assert_eq!(
        names,
        vec!["run_started", "step_status_changed", "step_status_changed", "run_finished"]
    );
    assert!(matches!(
        events[1],
        WorkflowEvent::StepStatusChanged { from: Pending, to: Running, .. }
    ));
    assert!(matches!(
        events[2],
        WorkflowEvent::StepStatusChanged { from: Running, to: Completed, .. }
    ));
}

#[tokio::test]
async fn test_condition_matches_case_insensitively() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "SBA Eligibility: Eligible for further review")
            .with_default_text("ok")
            .build(),
    );
    let workflow = gated_three_step("ELIGIBLE", OnFailure::Stop);

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Completed, Completed]);
    assert!(mock.was_invoked("b"));
}

#[tokio::test]
async fn test_unsatisfied_stop_condition_stops_remaining_steps() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "Screening result: FAIL")
            .with_default_text("ok")
            .build(),
    );
    let workflow = gated_three_step("PASS", OnFailure::Stop);

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Stopped, Stopped]);
    assert_eq!(state.workflow_status, WorkflowStatus::Done);
    assert_eq!(state.error, None);
    assert_eq!(mock.invoked_agents(), vec!["a"]);
}

#[tokio::test]
async fn test_unsatisfied_skip_condition_continues_with_earlier_output() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "Screening result: FAIL")
            .with_success("c", "C out")
            .build(),
    );
    let workflow = gated_three_step("PASS", OnFailure::Skip);

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Skipped, Completed]);
    assert!(state.result(1).is_none());
    assert!(!mock.was_invoked("b"));
    let c_input = &mock.inputs_for("c")[0];
    assert!(c_input.ends_with("PREVIOUS ANALYSIS:\nScreening result: FAIL"));
}

#[tokio::test]
async fn test_invocation_failure_halts_run() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_error("a", "quota exceeded")
            .with_default_text("ok")
            .build(),
    );
    let workflow = WorkflowBuilder::new("seq").step("a").step("b").step("c").build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Failed, Pending, Pending]);
    assert_eq!(state.workflow_status, WorkflowStatus::Done);
    assert_eq!(state.error.as_deref(), Some("quota exceeded"));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_empty_error_message_gets_fallback() {
    let (executor, _mock) = mock_executor(
        registry_with(&["a"]),
        MockAgentInvoker::builder().with_error("a", "").build(),
    );
    let workflow = WorkflowBuilder::new("one").step("a").build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.error.as_deref(), Some("An unknown error occurred."));
    assert_eq!(state.step_statuses, vec![Failed]);
}

#[tokio::test]
async fn test_missing_agent_fails_without_invoking_anything() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = WorkflowBuilder::new("broken")
        .step("nonexistent")
        .step("a")
        .build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Failed, Pending]);
    assert_eq!(state.workflow_status, WorkflowStatus::Done);
    assert_eq!(
        state.error.as_deref(),
        Some("Configuration error: Agent with ID \"nonexistent\" not found.")
    );
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_missing_agent_is_fatal_even_mid_workflow() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = WorkflowBuilder::new("broken")
        .step("a")
        .conditional_step("ghost", "a", "ok", OnFailure::Skip)
        .step("c")
        .build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Failed, Pending]);
    assert_eq!(mock.invoked_agents(), vec!["a"]);
}

#[tokio::test]
async fn test_missing_agent_is_checked_before_its_condition() {
    for on_failure in [OnFailure::Skip, OnFailure::Stop] {
        let (executor, mock) = mock_executor(
            abc_registry(),
            MockAgentInvoker::builder().with_success("a", "Ineligible").build(),
        );
        let workflow = WorkflowBuilder::new("broken")
            .step("a")
            .conditional_step("ghost", "a", "approved", on_failure)
            .step("c")
            .build();

        let state = executor.run(&workflow, &sample_deal()).await.unwrap();

        assert_eq!(state.step_statuses, vec![Completed, Failed, Pending], "{on_failure}");
        assert_eq!(
            state.error.as_deref(),
            Some("Configuration error: Agent with ID \"ghost\" not found.")
        );
        assert_eq!(mock.invoked_agents(), vec!["a"]);
    }
}

#[tokio::test]
async fn test_condition_on_later_step_is_never_satisfied() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = WorkflowBuilder::new("forward")
        .conditional_step("a", "b", "ok", OnFailure::Skip)
        .step("b")
        .build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Skipped, Completed]);
    assert_eq!(mock.inputs_for("b"), vec![String::new()]);
}

#[tokio::test]
async fn test_self_referencing_condition_is_not_satisfied() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = WorkflowBuilder::new("self")
        .conditional_step("a", "a", "", OnFailure::Stop)
        .step("b")
        .build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Stopped, Stopped]);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_only_latest_output_is_threaded_forward() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "first")
            .with_success("b", "second")
            .with_success("c", "third")
            .build(),
    );
    let workflow = WorkflowBuilder::new("seq").step("a").step("b").step("c").build();

    executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(mock.inputs_for("a"), vec![String::new()]);
    let c_input = &mock.inputs_for("c")[0];
    assert!(c_input.contains("second"));
    assert!(!c_input.contains("first"));
}

#[tokio::test]
async fn test_results_keep_sources_and_metrics() {
    let metrics = ScenarioMetrics {
        total_equity_needed: Some(50000.0),
        dscr_estimate: Some(1.4),
        post_close_liquidity: None,
    };
    let (executor, _mock) = mock_executor(
        registry_with(&["a"]),
        MockAgentInvoker::builder()
            .with_result("a", AgentResult::new("stack").with_metrics(metrics))
            .build(),
    );
    let workflow = WorkflowBuilder::new("one").step("a").build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.result(0).unwrap().structured_metrics, Some(metrics));
}

#[tokio::test]
async fn test_duplicate_agent_ids_resolve_condition_to_first_step() {
    let (executor, _mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "PASS")
            .with_success("a", "FAIL")
            .with_default_text("ok")
            .build(),
    );
    let workflow = WorkflowBuilder::new("dup")
        .step("a")
        .step("a")
        .conditional_step("b", "a", "pass", OnFailure::Stop)
        .build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert_eq!(state.step_statuses, vec![Completed, Completed, Completed]);
}

#[tokio::test]
async fn test_empty_workflow_finishes_immediately() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().build(),
    );
    let workflow = WorkflowBuilder::new("empty").build();

    let state = executor.run(&workflow, &sample_deal()).await.unwrap();

    assert!(state.step_statuses.is_empty());
    assert_eq!(state.workflow_status, WorkflowStatus::Done);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_used_state_is_rejected() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_error("a", "boom").build(),
    );
    let workflow = WorkflowBuilder::new("one").step("a").build();
    let mut state = ExecutionState::for_workflow(&workflow);
    executor
        .execute(&workflow, &sample_deal(), &mut state, &NoopObserver)
        .await
        .unwrap();

    let err = executor
        .execute(&workflow, &sample_deal(), &mut state, &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StateNotFresh(_)));
    assert_eq!(mock.call_count(), 1);
    assert_eq!(state.step_statuses, vec![Failed]);
}

#[tokio::test]
async fn test_restart_with_fresh_state_begins_at_first_step() {
    let (executor, mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder()
            .with_success("a", "A out")
            .with_error("b", "timeout")
            .with_success("b", "B out")
            .build(),
    );
    let workflow = WorkflowBuilder::new("seq").step("a").step("b").build();

    let first = executor.run(&workflow, &sample_deal()).await.unwrap();
    assert_eq!(first.step_statuses, vec![Completed, Failed]);

    let second = executor.run(&workflow, &sample_deal()).await.unwrap();
    assert_eq!(second.step_statuses, vec![Completed, Completed]);
    assert_eq!(second.error, None);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(mock.invoked_agents(), vec!["a", "b", "a", "b"]);
}

#[tokio::test]
async fn test_start_run_streams_updates_then_returns_state() {
    let (executor, _mock) = mock_executor(
        abc_registry(),
        MockAgentInvoker::builder().with_default_text("ok").build(),
    );
    let workflow = Arc::new(WorkflowBuilder::new("seq").step("a").step("b").build());

    let mut handle = executor.start_run(workflow, Arc::new(sample_deal()));
    let run_id = handle.run_id();
    let mut updates = Vec::new();
    while let Some(update) = handle.next_update().await {
        assert_eq!(update.state.run_id, run_id);
        updates.push(update);
    }
    let state = handle.wait().await.unwrap();

    assert_eq!(updates.len(), 6);
    assert_eq!(updates.last().unwrap().state, state);
    assert_eq!(state.step_statuses, vec![Completed, Completed]);
}
