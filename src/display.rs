use anyhow::{Context, Result};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::types::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    Calibrate,
}

/// Where annotated frames end up. Driven from the main thread only.
///
/// Key state advances only when the window is updated, either by `show` or
/// by `refresh`. Callers read `poll_command` once after each update.
pub trait Display {
    fn show(&mut self, frame: &Frame) -> Result<()>;

    /// Processes window events without a new frame. Returns whether input
    /// state advanced, i.e. whether `poll_command` has anything new to say.
    fn refresh(&mut self) -> Result<bool> {
        Ok(false)
    }

    /// Command for keys pressed since the last update, if any.
    fn poll_command(&mut self) -> Option<KeyCommand>;
}

pub fn key_command(key: Key) -> Option<KeyCommand> {
    match key {
        Key::Q | Key::Escape => Some(KeyCommand::Quit),
        Key::C => Some(KeyCommand::Calibrate),
        _ => None,
    }
}

/// Quit wins over calibrate when both are pressed in the same poll.
pub fn resolve_keys(keys: &[Key]) -> Option<KeyCommand> {
    let mut command = None;
    for cmd in keys.iter().copied().filter_map(key_command) {
        if cmd == KeyCommand::Quit {
            return Some(cmd);
        }
        command = Some(cmd);
    }
    command
}

/// Hands out the pressed keys at most once per window update.
///
/// minifb reports a key as pressed until the next update ages it, so reading
/// twice between updates would deliver the same press twice.
#[derive(Debug, Default)]
pub struct KeyLatch {
    fresh: bool,
}

impl KeyLatch {
    pub fn arm(&mut self) {
        self.fresh = true;
    }

    pub fn take<F>(&mut self, pressed: F) -> Option<KeyCommand>
    where
        F: FnOnce() -> Vec<Key>,
    {
        if !std::mem::take(&mut self.fresh) {
            return None;
        }
        resolve_keys(&pressed())
    }
}

/// RGBA bytes into minifb's `0RGB` words.
pub fn rgba_to_argb(rgba: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgba.chunks_exact(4)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
    );
}

/// Desktop preview window. It is created on the first frame so it can take
/// the camera's resolution, and recreated if that resolution changes.
pub struct MinifbDisplay {
    title: String,
    window: Option<Window>,
    keys: KeyLatch,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbDisplay {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            window: None,
            keys: KeyLatch::default(),
            buffer: Vec::new(),
            width: 0,
            height: 0,
        }
    }

    fn window_for(&mut self, width: usize, height: usize) -> Result<&mut Window> {
        if self.window.is_none() || self.width != width || self.height != height {
            let window = Window::new(
                &self.title,
                width,
                height,
                WindowOptions {
                    resize: false,
                    ..WindowOptions::default()
                },
            )
            .with_context(|| format!("failed to open {width}x{height} preview window"))?;
            log::debug!("preview window opened at {width}x{height}");
            self.window = Some(window);
            self.width = width;
            self.height = height;
        }
        self.window
            .as_mut()
            .context("preview window missing after creation")
    }
}

impl Display for MinifbDisplay {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        let (width, height) = (frame.width as usize, frame.height as usize);
        let mut buffer = std::mem::take(&mut self.buffer);
        rgba_to_argb(&frame.rgba, &mut buffer);
        let window = self.window_for(width, height)?;
        let result = window
            .update_with_buffer(&buffer, width, height)
            .context("failed to present frame");
        self.buffer = buffer;
        if result.is_ok() {
            self.keys.arm();
        }
        result
    }

    fn refresh(&mut self) -> Result<bool> {
        let Some(window) = self.window.as_mut() else {
            return Ok(false);
        };
        window.update();
        self.keys.arm();
        Ok(true)
    }

    fn poll_command(&mut self) -> Option<KeyCommand> {
        let window = self.window.as_ref()?;
        if !window.is_open() {
            return Some(KeyCommand::Quit);
        }
        self.keys.take(|| window.get_keys_pressed(KeyRepeat::No))
    }
}
