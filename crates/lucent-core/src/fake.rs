//! In-memory `WindowApi` used by the engine tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::opacity::{alpha_to_percent, percent_to_alpha};
use crate::window::{EnumeratedWindow, WindowApi};
use crate::{Error, Rect, Result};

#[derive(Debug, Clone)]
pub(crate) struct FakeWindow {
    pub title: String,
    pub process_name: String,
    pub rect: Rect,
    pub layered: bool,
    pub alpha: u8,
    pub topmost: bool,
    pub click_through: bool,
}

#[derive(Default)]
pub(crate) struct FakeWindowApi {
    windows: Mutex<BTreeMap<usize, FakeWindow>>,
    foreground: Mutex<Option<usize>>,
    /// Windows that enumerate but fail every property query.
    vanishing: Mutex<HashSet<usize>>,
    moves: Mutex<Vec<(usize, Rect)>>,
}

impl FakeWindowApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, hwnd: usize, title: &str, process_name: &str, rect: Rect) {
        self.windows.lock().unwrap().insert(
            hwnd,
            FakeWindow {
                title: title.into(),
                process_name: process_name.into(),
                rect,
                layered: false,
                alpha: 255,
                topmost: false,
                click_through: false,
            },
        );
    }

    pub fn close(&self, hwnd: usize) {
        self.windows.lock().unwrap().remove(&hwnd);
    }

    pub fn vanish_during_query(&self, hwnd: usize) {
        self.vanishing.lock().unwrap().insert(hwnd);
    }

    pub fn set_title(&self, hwnd: usize, title: &str) {
        if let Some(w) = self.windows.lock().unwrap().get_mut(&hwnd) {
            w.title = title.into();
        }
    }

    /// Simulates the user dragging a window (not recorded as a programmatic move).
    pub fn drag_to(&self, hwnd: usize, x: i32, y: i32) {
        if let Some(w) = self.windows.lock().unwrap().get_mut(&hwnd) {
            w.rect = w.rect.at(x, y);
        }
    }

    pub fn set_foreground(&self, hwnd: Option<usize>) {
        *self.foreground.lock().unwrap() = hwnd;
    }

    pub fn window(&self, hwnd: usize) -> FakeWindow {
        self.windows.lock().unwrap()[&hwnd].clone()
    }

    /// Programmatic `set_rect` calls, in order.
    pub fn moves(&self) -> Vec<(usize, Rect)> {
        self.moves.lock().unwrap().clone()
    }

    fn with<T>(&self, hwnd: usize, f: impl FnOnce(&mut FakeWindow) -> T) -> Result<T> {
        if self.vanishing.lock().unwrap().contains(&hwnd) {
            return Err(Error::WindowGone(hwnd));
        }
        let mut windows = self.windows.lock().unwrap();
        let window = windows.get_mut(&hwnd).ok_or(Error::WindowGone(hwnd))?;
        Ok(f(window))
    }
}

impl WindowApi for FakeWindowApi {
    fn enumerate(&self) -> Result<Vec<EnumeratedWindow>> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|(&hwnd, w)| EnumeratedWindow {
                hwnd,
                title: w.title.clone(),
                process_name: w.process_name.clone(),
                process_id: hwnd as u32,
            })
            .collect())
    }

    fn rect(&self, hwnd: usize) -> Result<Rect> {
        self.with(hwnd, |w| w.rect)
    }

    fn set_rect(&self, hwnd: usize, rect: &Rect) -> Result<()> {
        self.with(hwnd, |w| w.rect = *rect)?;
        self.moves.lock().unwrap().push((hwnd, *rect));
        Ok(())
    }

    fn opacity(&self, hwnd: usize) -> Result<u8> {
        self.with(hwnd, |w| {
            if w.layered {
                alpha_to_percent(w.alpha)
            } else {
                100
            }
        })
    }

    fn set_opacity(&self, hwnd: usize, percent: u8) -> Result<()> {
        self.with(hwnd, |w| {
            w.layered = true;
            w.alpha = percent_to_alpha(percent);
        })
    }

    fn is_topmost(&self, hwnd: usize) -> Result<bool> {
        self.with(hwnd, |w| w.topmost)
    }

    fn set_topmost(&self, hwnd: usize, topmost: bool) -> Result<()> {
        self.with(hwnd, |w| w.topmost = topmost)
    }

    fn is_click_through(&self, hwnd: usize) -> Result<bool> {
        self.with(hwnd, |w| w.click_through)
    }

    fn set_click_through(&self, hwnd: usize, enabled: bool) -> Result<()> {
        self.with(hwnd, |w| {
            w.click_through = enabled;
            if enabled {
                w.layered = true;
            }
        })
    }

    fn foreground(&self) -> Option<usize> {
        *self.foreground.lock().unwrap()
    }

    fn monitor_id(&self, _hwnd: usize) -> String {
        "DISPLAY1".into()
    }
}
