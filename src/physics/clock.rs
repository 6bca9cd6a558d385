/// Slack allowed when comparing accumulated time against the step length,
/// so that e.g. three 1/60 s frames reliably produce three steps.
const TIME_EPSILON: f64 = 1e-9;

/// Accumulator turning variable frame times into a whole number of fixed steps.
///
/// Only the accumulator lives here. The clock source belongs to whoever
/// drives the simulation and passes in elapsed time.
#[derive(Clone, Copy, Debug)]
pub struct FixedTimestep {
    dt: f64,
    max_acc: f64,
    acc: f64,
}

impl FixedTimestep {
    pub fn new(dt: f64, max_accumulated: f64) -> Self {
        FixedTimestep {
            dt,
            // must fit at least one step or nothing would ever run
            max_acc: max_accumulated.max(dt),
            acc: 0.0,
        }
    }

    /// Add elapsed time and return how many steps should be run.
    pub fn advance(&mut self, elapsed: f64) -> usize {
        if elapsed > 0.0 {
            self.acc += elapsed;
        }
        // limit acc to prevent spiral of death
        if self.acc > self.max_acc {
            self.acc = self.max_acc;
        }

        let mut steps = 0;
        while self.acc + TIME_EPSILON >= self.dt {
            self.acc = (self.acc - self.dt).max(0.0);
            steps += 1;
        }
        steps
    }

    /// Time waiting in the accumulator, less than one step.
    #[inline]
    pub fn accumulated(&self) -> f64 {
        self.acc
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// How far between the last step and the next one we are, in `[0, 1)`.
    /// Useful for interpolating rendered positions.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.acc / self.dt
    }

    pub fn reset(&mut self) {
        self.acc = 0.0;
    }
}
