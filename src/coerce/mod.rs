pub mod coercer;
