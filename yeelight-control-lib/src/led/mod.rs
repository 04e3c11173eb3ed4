pub mod flow;
pub mod led_color;
