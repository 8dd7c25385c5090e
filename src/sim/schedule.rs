//! Deferred actions keyed by simulation time

/// Queue of actions that fire once the owner's clock reaches their due time.
///
/// Actions due at the same time fire in insertion order.
#[derive(Debug, Clone)]
pub struct Schedule<A> {
    now: f32,
    seq: u64,
    entries: Vec<Entry<A>>,
}

#[derive(Debug, Clone)]
struct Entry<A> {
    due: f32,
    seq: u64,
    action: A,
}

impl<A> Default for Schedule<A> {
    fn default() -> Self {
        Self {
            now: 0.0,
            seq: 0,
            entries: Vec::new(),
        }
    }
}

impl<A> Schedule<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time on this schedule's clock
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Run `action` `delay` seconds from now
    pub fn push_after(&mut self, delay: f32, action: A) {
        let seq = self.seq;
        self.seq += 1;
        self.entries.push(Entry {
            due: self.now + delay.max(0.0),
            seq,
            action,
        });
    }

    /// Advance the clock by `dt` and take every action that is now due
    pub fn advance(&mut self, dt: f32) -> Vec<A> {
        self.now += dt;
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|e| e.due <= now);
        self.entries = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|e| e.action).collect()
    }

    /// Whether any pending action matches `pred`
    pub fn pending(&self, pred: impl Fn(&A) -> bool) -> bool {
        self.entries.iter().any(|e| pred(&e.action))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending action and restart the clock
    pub fn clear(&mut self) {
        self.entries.clear();
        self.now = 0.0;
    }
}
