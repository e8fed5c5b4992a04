/// Single-shot deadline on the sample clock (nanoseconds).
///
/// At most one deadline is pending. Arming replaces whatever was pending, so a
/// tick scheduled for an earlier gesture can never fire against a later one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickTimer {
    deadline: Option<i64>,
}

impl TickTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, now: i64, delay: i64) {
        self.deadline = Some(now.saturating_add(delay));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    /// Take the pending deadline if it is due at `now`.
    pub fn take_due(&mut self, now: i64) -> Option<i64> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.deadline.take(),
            _ => None,
        }
    }
}
