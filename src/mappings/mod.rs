pub mod keysym_to_name;

pub use keysym_to_name::KeysymToName;
