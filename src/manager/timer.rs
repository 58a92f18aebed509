use std::time::{Duration, Instant};

/// One-shot quantum countdown, re-armed on every resume.
#[derive(Debug, Clone)]
pub struct PreemptionTimer {
    quantum: Duration,
    deadline: Option<Instant>,
}

impl PreemptionTimer {
    pub fn new(quantum: Duration) -> Self {
        Self {
            quantum,
            deadline: None,
        }
    }

    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    pub fn arm_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.quantum);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disarmed() {
        let timer = PreemptionTimer::new(Duration::from_millis(10));
        assert_eq!(timer.deadline(), None);
        assert!(!timer.is_expired_at(Instant::now()));
    }

    #[test]
    fn rearming_pushes_the_deadline() {
        let mut timer = PreemptionTimer::new(Duration::from_secs(2));
        let t0 = Instant::now();
        timer.arm_at(t0);
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_secs(2)));
        assert!(!timer.is_expired_at(t0 + Duration::from_secs(1)));
        assert!(timer.is_expired_at(t0 + Duration::from_secs(2)));

        timer.arm_at(t0 + Duration::from_secs(1));
        assert!(!timer.is_expired_at(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn disarm_clears() {
        let mut timer = PreemptionTimer::new(Duration::from_millis(1));
        timer.arm();
        timer.disarm();
        assert_eq!(timer.deadline(), None);
    }
}
