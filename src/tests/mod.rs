pub mod common;

mod startup;
