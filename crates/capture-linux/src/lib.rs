// Linux platform implementations

#[cfg(target_os = "linux")]
pub mod screen_x11;
#[cfg(target_os = "linux")]
pub mod screen;

// pub mod screen_wayland;  // needs xdg-desktop-portal permission flow
