pub mod change_entry;
