use triad_mvp::adapters::channel::{TriadEvent, TriadEventQueue};
use triad_mvp::core::triad_presenter::{
    FIELD_ERROR_MESSAGE, TOTAL_ERROR_MESSAGE, TOTAL_FORMAT_MESSAGE,
};
use triad_mvp::{FieldId, Triple, TriadError, TriadPresenter};

fn presenter(total: i64, values: Triple) -> TriadPresenter<TriadEventQueue> {
    let mut presenter = TriadPresenter::new(TriadEventQueue::new(), total, values).unwrap();
    presenter.listener_mut().drain();
    presenter
}

fn last_values(events: &[TriadEvent]) -> Option<Triple> {
    events.iter().rev().find_map(|e| match e {
        TriadEvent::ValuesChanged(v) => Some(*v),
        _ => None,
    })
}

#[test]
fn test_construction_emits_total_then_values() {
    let mut presenter =
        TriadPresenter::new(TriadEventQueue::new(), 100, Triple::new(34, 33, 33)).unwrap();
    assert_eq!(
        presenter.listener_mut().drain(),
        vec![
            TriadEvent::TotalChanged(100),
            TriadEvent::ValuesChanged(Triple::new(34, 33, 33)),
        ]
    );
}

#[test]
fn test_negative_initial_total_is_rejected() {
    let result = TriadPresenter::new(TriadEventQueue::new(), -5, Triple::default());
    assert!(matches!(result, Err(TriadError::InvalidArgument { .. })));
}

#[test]
fn test_edits_update_values_using_policy() {
    let mut presenter = presenter(100, Triple::new(30, 40, 30));

    presenter.on_field_edited(FieldId::First, "50");
    assert_eq!(
        last_values(&presenter.listener_mut().drain()),
        Some(Triple::new(50, 20, 30))
    );

    presenter.on_field_edited(FieldId::Second, "10");
    assert_eq!(
        last_values(&presenter.listener_mut().drain()),
        Some(Triple::new(50, 10, 40))
    );
    assert_eq!(presenter.current_values(), Triple::new(50, 10, 40));
}

#[test]
fn test_invalid_input_emits_validation_error_and_keeps_values() {
    let mut presenter = presenter(100, Triple::new(25, 25, 50));

    for text in ["abc", "", "  ", "-3", "1.5"] {
        presenter.on_field_edited(FieldId::Third, text);
        assert_eq!(
            presenter.listener_mut().drain(),
            vec![TriadEvent::ValidationError {
                field: Some(FieldId::Third),
                message: FIELD_ERROR_MESSAGE.to_string(),
            }],
            "input {:?}",
            text
        );
    }
    assert_eq!(presenter.current_values(), Triple::new(25, 25, 50));
}

#[test]
fn test_whitespace_around_numbers_is_accepted() {
    let mut presenter = presenter(100, Triple::new(30, 40, 30));
    presenter.on_field_edited(FieldId::First, " 50 ");
    assert_eq!(presenter.current_values(), Triple::new(50, 20, 30));
}

#[test]
fn test_changing_total_rebalances() {
    let mut presenter = presenter(100, Triple::new(40, 30, 30));

    presenter.set_total(60);
    let events = presenter.listener_mut().drain();
    assert_eq!(events[0], TriadEvent::TotalChanged(60));
    // A 以現值重新套用：保留 C，B 吸收差額
    assert_eq!(last_values(&events), Some(Triple::new(40, 0, 20)));
    assert_eq!(presenter.current_total(), 60);
    assert_eq!(presenter.current_values().sum(), 60);
}

#[test]
fn test_shrinking_total_below_first_clamps_first() {
    let mut presenter = presenter(100, Triple::new(80, 10, 10));
    presenter.set_total(50);
    assert_eq!(presenter.current_values(), Triple::new(50, 0, 0));

    presenter.set_total(0);
    assert_eq!(presenter.current_values(), Triple::new(0, 0, 0));
}

#[test]
fn test_growing_total_goes_to_second() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));
    presenter.set_total(130);
    assert_eq!(presenter.current_values(), Triple::new(34, 63, 33));
}

#[test]
fn test_negative_total_is_a_validation_error_without_state_change() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));

    presenter.set_total(-1);
    assert_eq!(
        presenter.listener_mut().drain(),
        vec![TriadEvent::ValidationError {
            field: None,
            message: TOTAL_ERROR_MESSAGE.to_string(),
        }]
    );
    assert_eq!(presenter.current_total(), 100);
    assert_eq!(presenter.current_values(), Triple::new(34, 33, 33));
}

#[test]
fn test_unparseable_or_oversized_total_reports_format_error() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));
    presenter.listener_mut().drain();

    let too_big = (u64::from(u32::MAX) + 1).to_string();
    for text in ["lots", "", "12.5", too_big.as_str()] {
        presenter.set_total_text(text);
        assert_eq!(
            presenter.listener_mut().drain(),
            vec![TriadEvent::ValidationError {
                field: None,
                message: TOTAL_FORMAT_MESSAGE.to_string(),
            }],
            "total text {:?}",
            text
        );
    }

    presenter.set_total_text(" -5 ");
    assert_eq!(
        presenter.listener_mut().drain(),
        vec![TriadEvent::ValidationError {
            field: None,
            message: TOTAL_ERROR_MESSAGE.to_string(),
        }]
    );
    assert_eq!(presenter.current_total(), 100);
    assert_eq!(presenter.current_values(), Triple::new(34, 33, 33));
}

#[test]
fn test_edits_are_ignored_during_programmatic_update() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));

    presenter.begin_programmatic_update();
    presenter.on_field_edited(FieldId::First, "90");
    presenter.on_field_edited(FieldId::Second, "not a number");
    presenter.end_programmatic_update();

    assert!(presenter.listener().is_empty());
    assert_eq!(presenter.current_values(), Triple::new(34, 33, 33));

    presenter.on_field_edited(FieldId::First, "90");
    assert_eq!(presenter.current_values(), Triple::new(90, 0, 10));
}

#[test]
fn test_scoped_guard_suppresses_and_releases() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));

    {
        let mut guard = presenter.programmatic_update();
        guard.on_field_edited(FieldId::Third, "5");
        assert_eq!(guard.current_values(), Triple::new(34, 33, 33));
    }
    assert!(presenter.listener().is_empty());

    presenter.on_field_edited(FieldId::Third, "5");
    assert_eq!(presenter.current_values(), Triple::new(62, 33, 5));
}

#[test]
fn test_total_changes_are_not_suppressed() {
    let mut presenter = presenter(100, Triple::new(34, 33, 33));
    let mut guard = presenter.programmatic_update();
    guard.set_total(10);
    assert_eq!(guard.current_total(), 10);
}
