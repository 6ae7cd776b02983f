use std::os::fd::AsFd;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use x11rb::connection::Connection;
use x11rb::properties::{WmHints, WmSizeHints, WmSizeHintsSpecification};
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt, CreateWindowAux, EventMask, PropMode, Visibility,
    Window, WindowClass,
};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::COPY_DEPTH_FROM_PARENT;

use crate::config;
use crate::core::ScaleFactor;
use crate::event::{self, Event, WaitOutcome};
use crate::platform::EventSource;

/// _NET_WM_STATE client message action: toggle.
const NET_WM_STATE_TOGGLE: u32 = 2;

x11rb::atom_manager! {
    Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
    }
}

/// The playback window and its X connection.
///
/// Owns event translation into [`Event`] and the bounded wait on the
/// connection fd. The window is destroyed on drop.
pub struct X11Session {
    conn: RustConnection,
    root: Window,
    window: Window,
    atoms: Atoms,
    min_keycode: u8,
    keysyms_per_keycode: usize,
    keysyms: Vec<u32>,
}

impl X11Session {
    /// Connect to the display and create the mapped playback window, sized
    /// by `scale` and titled with the media file path.
    pub fn connect(title: &str, scale: ScaleFactor) -> Result<Self> {
        let (conn, screen_num) =
            x11rb::connect(None).context("failed to connect to X server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;

        let atoms = Atoms::new(&conn)?.reply()?;

        let (width, height) = scale.to_x(config::DEFAULT_SIZE.0, config::DEFAULT_SIZE.1);
        let window = conn.generate_id()?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            root,
            1,
            1,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(screen.black_pixel)
                .event_mask(
                    EventMask::KEY_PRESS
                        | EventMask::STRUCTURE_NOTIFY
                        | EventMask::VISIBILITY_CHANGE,
                ),
        )?;

        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        let class = format!("{}\0{}\0", config::CLASS_NAME, config::CLASS_NAME);
        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            class.as_bytes(),
        )?;

        let mut wm_hints = WmHints::new();
        wm_hints.input = Some(true);
        wm_hints.set(&conn, window)?;

        let mut size_hints = WmSizeHints::new();
        size_hints.size = Some((
            WmSizeHintsSpecification::ProgramSpecified,
            width as i32,
            height as i32,
        ));
        let (min_w, min_h) = scale.to_x(config::MIN_SIZE.0, config::MIN_SIZE.1);
        let (max_w, max_h) = scale.to_x(config::MAX_SIZE.0, config::MAX_SIZE.1);
        size_hints.min_size = Some((min_w as i32, min_h as i32));
        size_hints.max_size = Some((max_w as i32, max_h as i32));
        size_hints.set_normal_hints(&conn, window)?;

        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )?;

        conn.map_window(window)?;
        conn.flush()?;

        // Keycode 0 column of the keyboard mapping, for keysym lookup.
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()
            .context("failed to fetch keyboard mapping")?;

        Ok(Self {
            conn,
            root,
            window,
            atoms,
            min_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode as usize,
            keysyms: mapping.keysyms,
        })
    }

    /// The connection fd, for closing in spawned children.
    pub fn raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn keysym_for(&self, keycode: u8) -> Option<u32> {
        let index =
            (keycode as usize).checked_sub(self.min_keycode as usize)? * self.keysyms_per_keycode;
        let keysym = *self.keysyms.get(index)?;
        (keysym != x11rb::NO_SYMBOL).then_some(keysym)
    }

    fn translate(&self, xevent: &XEvent) -> Option<Event> {
        match xevent {
            XEvent::ConfigureNotify(e) => Some(Event::GeometryChanged {
                x: e.x.into(),
                y: e.y.into(),
                width: e.width.into(),
                height: e.height.into(),
            }),
            XEvent::KeyPress(e) => self
                .keysym_for(e.detail)
                .map(|keysym| Event::KeyPressed { keysym }),
            XEvent::VisibilityNotify(e) => {
                if e.state == Visibility::FULLY_OBSCURED {
                    Some(Event::VisibilityChanged(event::Visibility::FullyObscured))
                } else if e.state == Visibility::UNOBSCURED {
                    Some(Event::VisibilityChanged(event::Visibility::Unobscured))
                } else {
                    None
                }
            }
            XEvent::ClientMessage(e) => {
                if e.format == 32 && e.data.as_data32()[0] == self.atoms.WM_DELETE_WINDOW {
                    Some(Event::CloseRequested)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl EventSource for X11Session {
    fn wait(&self, timeout: Duration) -> Result<WaitOutcome> {
        let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.conn.stream().as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(millis)) {
            Ok(0) => Ok(WaitOutcome::TimedOut),
            Ok(_) => Ok(WaitOutcome::Ready),
            Err(Errno::EINTR) => Ok(WaitOutcome::Interrupted),
            Err(err) => Err(err).context("poll on X connection failed"),
        }
    }

    fn next_event(&self) -> Result<Option<Event>> {
        // Untranslatable events (expose, mapping notifies, ...) are skipped
        // here so the caller's drain loop only sees typed events.
        while let Some(xevent) = self
            .conn
            .poll_for_event()
            .context("X connection broken")?
        {
            if let Some(event) = self.translate(&xevent) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn toggle_fullscreen(&self) -> Result<()> {
        let message = ClientMessageEvent::new(
            32,
            self.window,
            self.atoms._NET_WM_STATE,
            [
                NET_WM_STATE_TOGGLE,
                self.atoms._NET_WM_STATE_FULLSCREEN,
                0,
                0,
                0,
            ],
        );
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            message,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

impl Drop for X11Session {
    fn drop(&mut self) {
        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.flush();
    }
}
