mod brightness;
mod frame;
mod raw;
mod toggle;

pub use self::brightness::{Brightness, BrightnessError, BrightnessHandler};
pub use self::frame::FrameBuilder;
pub use self::raw::RawWriteHandler;
pub use self::toggle::{Toggle, ToggleHandler};
