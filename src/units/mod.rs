//! Units, cities and the unit-class table.

pub mod class;
pub mod city;
pub mod unit;

pub use class::{ClassStats, ClassTable, Domain, UnitClass};
pub use city::City;
pub use unit::{Unit, UnitStatus};
