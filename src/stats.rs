//! # Stats
//!
//! $$
//! y_t=\mu(\tau_1,\tau_2)+\alpha(\tau_1,\tau_2)'x_t+u_t,\qquad H_0:\ u_t\sim I(1)
//! $$
//!
pub mod cointegration;
