pub mod frame_window;
