//! Presenter for the triad panel.
//!
//! Holds the current total and triple, parses user text, runs the
//! [`TriadCalculator`] and notifies the view through a [`TriadListener`].
//! All calls are expected from a single owning thread.

use crate::core::triad::TriadCalculator;
use crate::domain::model::{FieldId, Triple};
use crate::domain::ports::TriadListener;
use crate::utils::error::{Result, TriadError};
use crate::utils::validation::parse_non_negative_int;
use std::ops::{Deref, DerefMut};

pub const FIELD_ERROR_MESSAGE: &str = "Please enter a whole number >= 0";
pub const TOTAL_ERROR_MESSAGE: &str = "Total must be >= 0";
pub const TOTAL_FORMAT_MESSAGE: &str = "Total must be a whole number >= 0";

pub struct TriadPresenter<L: TriadListener> {
    calculator: TriadCalculator,
    listener: L,
    total: u32,
    values: Triple,
    programmatic_update: bool,
}

impl<L: TriadListener> TriadPresenter<L> {
    /// Creates the presenter and immediately emits the initial snapshot
    /// (`on_total_changed`, then `on_values_changed`).
    pub fn new(listener: L, initial_total: i64, initial_values: Triple) -> Result<Self> {
        Self::with_calculator(TriadCalculator::new(), listener, initial_total, initial_values)
    }

    pub fn with_calculator(
        calculator: TriadCalculator,
        listener: L,
        initial_total: i64,
        initial_values: Triple,
    ) -> Result<Self> {
        let total = checked_total(initial_total)?;

        let mut presenter = Self {
            calculator,
            listener,
            total,
            values: initial_values,
            programmatic_update: false,
        };
        tracing::debug!(total, values = %initial_values, "triad presenter created");
        presenter.listener.on_total_changed(presenter.total);
        presenter.listener.on_values_changed(presenter.values);
        Ok(presenter)
    }

    /// Sets a new total and rebalances by re-applying A with its current value.
    pub fn set_total(&mut self, new_total: i64) {
        let total = match checked_total(new_total) {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!("Rejected total {}: {}", new_total, e);
                let message = if new_total < 0 {
                    TOTAL_ERROR_MESSAGE
                } else {
                    // 超出 u32 範圍
                    TOTAL_FORMAT_MESSAGE
                };
                self.listener.on_validation_error(None, message);
                return;
            }
        };

        // 不追蹤最後編輯的欄位，一律以 A 的現值重新套用
        let values = match self.calculator.adjust(
            self.values,
            FieldId::First,
            i64::from(self.values.a),
            i64::from(total),
        ) {
            Ok(values) => values,
            Err(e) => {
                self.listener.on_validation_error(None, &e.to_string());
                return;
            }
        };

        self.total = total;
        self.values = values;
        tracing::debug!(total, values = %values, "total changed");
        self.listener.on_total_changed(self.total);
        self.listener.on_values_changed(self.values);
    }

    /// Parses raw total text coming from the view, then behaves like [`Self::set_total`].
    pub fn set_total_text(&mut self, text: &str) {
        match text.trim().parse::<i64>() {
            Ok(total) => self.set_total(total),
            Err(_) => {
                tracing::debug!(text, "rejected total text");
                self.listener.on_validation_error(None, TOTAL_FORMAT_MESSAGE)
            }
        }
    }

    /// Called by the view when the user edits a field.
    ///
    /// Ignored entirely while a programmatic update is in progress.
    pub fn on_field_edited(&mut self, field: FieldId, text: &str) {
        if self.programmatic_update {
            return;
        }

        let Some(parsed) = parse_non_negative_int(text) else {
            tracing::debug!(field = %field, text, "rejected field edit");
            self.listener
                .on_validation_error(Some(field), FIELD_ERROR_MESSAGE);
            return;
        };

        match self.calculator.adjust(
            self.values,
            field,
            i64::from(parsed),
            i64::from(self.total),
        ) {
            Ok(values) => {
                self.values = values;
                tracing::debug!(field = %field, value = parsed, values = %values, "field edited");
                self.listener.on_values_changed(self.values);
            }
            Err(e) => self
                .listener
                .on_validation_error(Some(field), &e.to_string()),
        }
    }

    pub fn current_values(&self) -> Triple {
        self.values
    }

    pub fn current_total(&self) -> u32 {
        self.total
    }

    pub fn is_programmatic_update(&self) -> bool {
        self.programmatic_update
    }

    // view 以程式寫回欄位前後呼叫，避免編輯事件回灌
    pub fn begin_programmatic_update(&mut self) {
        self.programmatic_update = true;
    }

    pub fn end_programmatic_update(&mut self) {
        self.programmatic_update = false;
    }

    /// Suppresses field edits until the returned guard is dropped.
    ///
    /// The guard dereferences to the presenter, so the view can keep calling
    /// it while rendering; edits made through it are ignored.
    pub fn programmatic_update(&mut self) -> ProgrammaticUpdate<'_, L> {
        self.begin_programmatic_update();
        ProgrammaticUpdate { presenter: self }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }
}

fn checked_total(total: i64) -> Result<u32> {
    if total < 0 {
        return Err(TriadError::invalid_argument("total must be >= 0"));
    }
    u32::try_from(total).map_err(|_| {
        TriadError::invalid_argument(format!("total must be <= {}", u32::MAX))
    })
}

/// Scope during which the view writes values back into editable fields.
pub struct ProgrammaticUpdate<'a, L: TriadListener> {
    presenter: &'a mut TriadPresenter<L>,
}

impl<L: TriadListener> Deref for ProgrammaticUpdate<'_, L> {
    type Target = TriadPresenter<L>;

    fn deref(&self) -> &Self::Target {
        self.presenter
    }
}

impl<L: TriadListener> DerefMut for ProgrammaticUpdate<'_, L> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.presenter
    }
}

impl<L: TriadListener> Drop for ProgrammaticUpdate<'_, L> {
    fn drop(&mut self) {
        self.presenter.end_programmatic_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        values_changed: usize,
        totals_changed: usize,
        errors: usize,
    }

    impl TriadListener for Counting {
        fn on_values_changed(&mut self, _values: Triple) {
            self.values_changed += 1;
        }
        fn on_total_changed(&mut self, _total: u32) {
            self.totals_changed += 1;
        }
        fn on_validation_error(&mut self, _field: Option<FieldId>, _message: &str) {
            self.errors += 1;
        }
    }

    fn counting() -> TriadPresenter<Counting> {
        TriadPresenter::new(Counting::default(), 100, Triple::new(34, 33, 33)).unwrap()
    }

    #[test]
    fn test_construction_emits_snapshot() {
        let presenter = counting();
        assert_eq!(presenter.listener().totals_changed, 1);
        assert_eq!(presenter.listener().values_changed, 1);
        assert_eq!(presenter.current_total(), 100);
    }

    #[test]
    fn test_negative_initial_total_fails() {
        let result = TriadPresenter::new(Counting::default(), -1, Triple::default());
        assert!(matches!(result, Err(TriadError::InvalidArgument { .. })));
    }

    #[test]
    fn test_guard_resets_flag_on_drop() {
        let mut presenter = counting();
        {
            let mut guard = presenter.programmatic_update();
            assert!(guard.is_programmatic_update());
            guard.on_field_edited(FieldId::First, "1");
        }
        assert!(!presenter.is_programmatic_update());
        assert_eq!(presenter.current_values(), Triple::new(34, 33, 33));
        assert_eq!(presenter.listener().values_changed, 1);
    }

    #[test]
    fn test_guard_resets_flag_on_unwind() {
        let mut presenter = counting();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = presenter.programmatic_update();
            panic!("render failed");
        }));
        assert!(result.is_err());
        assert!(!presenter.is_programmatic_update());
    }

    #[test]
    fn test_unparseable_total_text() {
        let mut presenter = counting();
        presenter.set_total_text("lots");
        assert_eq!(presenter.listener().errors, 1);
        assert_eq!(presenter.current_total(), 100);

        presenter.set_total_text(" 60 ");
        assert_eq!(presenter.current_total(), 60);
        assert_eq!(presenter.current_values().sum(), 60);
    }
}
