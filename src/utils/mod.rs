pub mod text_utils;
pub mod time_utils;

pub fn bool_to_i32(value: bool) -> i32 {
  if value { 1 } else { 0 }
}
