/// Position within a wizard's declared step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepNavigator {
    current: usize,
    total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    Moved { from: usize, to: usize },
    /// The current step has this many validation errors.
    Blocked { errors: usize },
    AtBoundary,
}

impl StepNavigator {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.total
    }

    pub fn advance(&mut self) -> StepTransition {
        if self.is_last() {
            return StepTransition::AtBoundary;
        }
        let from = self.current;
        self.current += 1;
        StepTransition::Moved {
            from,
            to: self.current,
        }
    }

    pub fn retreat(&mut self) -> StepTransition {
        if self.is_first() {
            return StepTransition::AtBoundary;
        }
        let from = self.current;
        self.current -= 1;
        StepTransition::Moved {
            from,
            to: self.current,
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
