use crate::error::AnteError;

pub type Gas = u64;

/// Gas budget for one admission run.
///
/// Consumption only grows. A charge that reaches or passes the limit is
/// recorded, fails, and latches the meter so every later charge fails without
/// moving the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    limit: Gas,
    consumed: Gas,
    infinite: bool,
    exhausted: bool,
}

impl GasMeter {
    pub fn new(limit: Gas) -> Self {
        Self {
            limit,
            consumed: 0,
            infinite: false,
            exhausted: false,
        }
    }

    /// A meter without a budget, used for simulation and genesis.
    pub fn infinite() -> Self {
        Self {
            limit: Gas::MAX,
            consumed: 0,
            infinite: true,
            exhausted: false,
        }
    }

    /// Charge `amount` for the work named by `descriptor`.
    pub fn consume(&mut self, amount: Gas, descriptor: &str) -> Result<(), AnteError> {
        if self.exhausted {
            return Err(self.out_of_gas(descriptor));
        }

        match self.consumed.checked_add(amount) {
            Some(total) => {
                self.consumed = total;
                if !self.infinite && total >= self.limit {
                    self.exhausted = true;
                    return Err(self.out_of_gas(descriptor));
                }
                Ok(())
            }
            None => {
                // u64 overflow
                self.consumed = Gas::MAX;
                self.exhausted = true;
                Err(self.out_of_gas(descriptor))
            }
        }
    }

    pub fn limit(&self) -> Gas {
        self.limit
    }

    pub fn consumed(&self) -> Gas {
        self.consumed
    }

    /// Consumption capped at the limit, the figure hosts bill against.
    pub fn consumed_to_limit(&self) -> Gas {
        self.consumed.min(self.limit)
    }

    pub fn remaining(&self) -> Gas {
        self.limit.saturating_sub(self.consumed)
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn is_out_of_gas(&self) -> bool {
        self.exhausted
    }

    fn out_of_gas(&self, descriptor: &str) -> AnteError {
        AnteError::OutOfGas {
            descriptor: descriptor.to_string(),
            limit: self.limit,
            used: self.consumed,
        }
    }
}
