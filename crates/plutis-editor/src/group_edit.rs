//! In-place editing of text that lives inside a group.
//!
//! A double click on a group whose text member is under the pointer
//! dissolves the group, puts the text in editing mode with its whole content
//! selected, and arms an [`EditSession`]. When that text leaves editing the
//! session regroups exactly the original members, in their original order.
//!
//! ```text
//! Idle --dblclick on text in group--> Dissolved --enter editing--> Editing
//!   ^                                                                 |
//!   +------------------ editing exited / cancel ----------------------+
//! ```

use crate::controllers::ControllerOptions;
use crate::error::Result;
use crate::events::EditorEvent;
use kurbo::{Point, Rect};
use plutis_core::{GroupOptions, PointerInput, Shape, ShapeId, Surface};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Where an edit session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    /// The group is gone and its members sit loose on the canvas.
    Dissolved,
    /// The text is in editing mode; leaving it regroups the members.
    Editing,
}

/// How an edit session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditCompletion {
    /// The text left editing normally.
    Exited,
    /// The session was cancelled (explicitly, by timeout or by teardown).
    Cancelled,
}

#[derive(Debug, Default)]
struct ExitSignal {
    completion: Option<EditCompletion>,
    wakers: Vec<Waker>,
}

impl ExitSignal {
    fn complete(&mut self, completion: EditCompletion) {
        if self.completion.is_none() {
            self.completion = Some(completion);
            for waker in self.wakers.drain(..) {
                waker.wake();
            }
        }
    }
}

/// One dissolved group waiting for its text to leave editing.
#[derive(Clone)]
pub struct EditSession {
    /// Id of the group that was dissolved.
    pub group_id: ShapeId,
    /// The text being edited.
    pub text_id: ShapeId,
    /// Former members, in their order inside the group.
    pub pending_members: Vec<ShapeId>,
    /// Set once editing started; cleared as soon as the session ends.
    pub armed: bool,
    pub phase: EditPhase,
    pub started: Instant,
    signal: Rc<RefCell<ExitSignal>>,
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("group_id", &self.group_id)
            .field("text_id", &self.text_id)
            .field("pending_members", &self.pending_members)
            .field("armed", &self.armed)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl EditSession {
    /// Time since the group was dissolved.
    pub fn age(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Resolves when an edit session ends.
#[derive(Debug)]
pub struct EditExit {
    signal: Rc<RefCell<ExitSignal>>,
}

impl Future for EditExit {
    type Output = EditCompletion;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut signal = self.signal.borrow_mut();
        match signal.completion {
            Some(completion) => Poll::Ready(completion),
            None => {
                if !signal.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    signal.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Inclusive on every edge: a pointer exactly on the border still counts.
fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// What a double click landed on.
struct Hit {
    group_id: ShapeId,
    text_id: ShapeId,
}

fn find_edit_target(surface: &Surface, group_id: ShapeId, pointer: Point) -> Option<Hit> {
    let group = surface.get(group_id)?.as_group()?;
    let matrix = group.calc_transform_matrix();
    let text_id = group
        .members()
        .iter()
        .filter(|member| member.supports_inline_edit())
        .find(|member| {
            member
                .as_text()
                .is_some_and(|text| contains_inclusive(text.edit_box(matrix), pointer))
        })
        .map(Shape::id)?;
    Some(Hit { group_id, text_id })
}

/// Drives the dissolve / edit / regroup cycle.
#[derive(Debug)]
pub struct GroupEditor {
    options: ControllerOptions,
    sessions: RefCell<HashMap<ShapeId, EditSession>>,
}

impl GroupEditor {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            options,
            sessions: RefCell::new(HashMap::new()),
        }
    }

    /// React to a double click. Returns the text that entered editing, or
    /// None when the click did not land on a text inside a group.
    pub fn handle_double_click(
        &self,
        target: Option<ShapeId>,
        e: &PointerInput,
    ) -> Result<Option<ShapeId>> {
        let Some(target) = target else {
            log::trace!("Double click without target ignored");
            return Ok(None);
        };
        let hit = self.options.canvas.read(|s| {
            let pointer = s.get_pointer(e.position);
            find_edit_target(s, target, pointer)
        })?;
        let Some(Hit { group_id, text_id }) = hit else {
            log::trace!("Double click on {} has no editable text under the pointer", target);
            return Ok(None);
        };

        self.finish_current_edit()?;

        // Dissolved: members back on the canvas where the group was.
        let members = self.options.canvas.write(|s| {
            s.widgets.remove(group_id);
            let members = s.document.ungroup_shape(group_id)?;
            for &id in &members {
                let editable = s.get(id).is_some_and(Shape::supports_inline_edit);
                if !editable {
                    s.set_selectable(id, false);
                }
            }
            s.render_all();
            Some(members)
        })?;
        let Some(members) = members else {
            return Ok(None);
        };
        log::debug!(
            "Dissolved group {} ({} member(s)) to edit {}",
            group_id,
            members.len(),
            text_id
        );
        self.sessions.borrow_mut().insert(
            text_id,
            EditSession {
                group_id,
                text_id,
                pending_members: members,
                armed: false,
                phase: EditPhase::Dissolved,
                started: Instant::now(),
                signal: Rc::new(RefCell::new(ExitSignal::default())),
            },
        );
        self.options.emit(EditorEvent::GroupDissolved { group_id, text_id });

        // Editing: the text is the sole active object with everything selected.
        let editing = self.options.canvas.write(|s| {
            s.set_active_object(text_id) && s.enter_editing(text_id) && s.select_all_text().is_some()
        })?;
        if !editing {
            log::warn!("Text {} could not enter editing, regrouping", text_id);
            self.reform(text_id, EditCompletion::Cancelled)?;
            return Ok(None);
        }
        if let Some(session) = self.sessions.borrow_mut().get_mut(&text_id) {
            session.phase = EditPhase::Editing;
            session.armed = true;
        }
        // A plain text that was being edited lost focus to this one.
        self.flush_exits()?;

        self.options.emit(EditorEvent::EditingStarted { text_id });
        self.options.emit(EditorEvent::ObjectsChanged);
        self.options.sync_selection()?;
        Ok(Some(text_id))
    }

    /// React to a text leaving editing. Only the first notification for an
    /// armed session regroups; returns whether it did.
    pub fn handle_editing_exited(&self, target: ShapeId) -> Result<bool> {
        let armed = self
            .sessions
            .borrow()
            .get(&target)
            .is_some_and(|session| session.armed);
        if !armed {
            log::trace!("Editing exit of {} has no armed session", target);
            return Ok(false);
        }
        self.reform(target, EditCompletion::Exited)?;
        Ok(true)
    }

    /// End the session of `text_id` without waiting for the user.
    /// The members are regrouped; waiters see [`EditCompletion::Cancelled`].
    pub fn cancel(&self, text_id: ShapeId) -> Result<bool> {
        match self.sessions.borrow_mut().get_mut(&text_id) {
            Some(session) => session.armed = false,
            None => return Ok(false),
        }
        let editing = self.options.canvas.read(|s| s.is_editing(text_id))?;
        if editing {
            // Disarmed, so the exit notification below is ignored.
            self.exit_editing()?;
        }
        self.reform(text_id, EditCompletion::Cancelled)?;
        log::debug!("Edit of {} cancelled", text_id);
        self.options.emit(EditorEvent::EditCancelled { text_id });
        Ok(true)
    }

    /// Future that resolves when the session of `text_id` ends.
    pub fn wait_for_exit(&self, text_id: ShapeId) -> Option<EditExit> {
        self.sessions.borrow().get(&text_id).map(|session| EditExit {
            signal: Rc::clone(&session.signal),
        })
    }

    /// Sessions older than `timeout`, oldest first.
    pub fn stuck_sessions(&self, timeout: Duration) -> Vec<ShapeId> {
        let sessions = self.sessions.borrow();
        let mut stuck: Vec<&EditSession> = sessions
            .values()
            .filter(|session| session.age() >= timeout)
            .collect();
        stuck.sort_by_key(|session| session.started);
        for session in &stuck {
            log::warn!(
                "Edit of {} (group {}) open for {:?}",
                session.text_id,
                session.group_id,
                session.age()
            );
        }
        stuck.into_iter().map(|session| session.text_id).collect()
    }

    /// Cancel every session older than `timeout`. Returns how many ended.
    pub fn reap(&self, timeout: Duration) -> Result<usize> {
        let mut reaped = 0;
        for text_id in self.stuck_sessions(timeout) {
            if self.cancel(text_id)? {
                reaped += 1;
            }
        }
        Ok(reaped)
    }

    /// Drop every session without touching the canvas. Used at teardown.
    pub fn abandon_all(&self) {
        let sessions: Vec<EditSession> = self.sessions.borrow_mut().drain().map(|(_, s)| s).collect();
        for session in sessions {
            log::debug!("Abandoning edit of {}", session.text_id);
            session.signal.borrow_mut().complete(EditCompletion::Cancelled);
        }
    }

    pub fn session(&self, text_id: ShapeId) -> Option<EditSession> {
        self.sessions.borrow().get(&text_id).cloned()
    }

    /// Texts with an open session.
    pub fn active_sessions(&self) -> Vec<ShapeId> {
        self.sessions.borrow().keys().copied().collect()
    }

    /// Close the session of whatever text is being edited right now.
    fn finish_current_edit(&self) -> Result<()> {
        let editing = self.options.canvas.read(|s| s.editing_object())?;
        let open = editing.is_some_and(|id| self.sessions.borrow().contains_key(&id));
        if open {
            self.exit_editing()?;
        }
        Ok(())
    }

    /// Leave editing so every exit listener runs, this one included.
    fn exit_editing(&self) -> Result<()> {
        self.options.canvas.write(|s| {
            if s.exit_editing().is_some() {
                s.request_render();
            }
        })?;
        self.flush_exits()
    }

    /// Report ended edits. Without an editor to dispatch them, this is the
    /// only exit listener and handles them directly.
    fn flush_exits(&self) -> Result<()> {
        match self.options.editor.upgrade() {
            Some(editor) => {
                editor.canvas().flush_editing_exits()?;
            }
            None => {
                for text_id in self.options.canvas.write(Surface::take_ended_edits)? {
                    self.handle_editing_exited(text_id)?;
                }
            }
        }
        Ok(())
    }

    /// Regroup the members of a session and resolve its waiters.
    fn reform(&self, text_id: ShapeId, completion: EditCompletion) -> Result<Option<ShapeId>> {
        let Some(mut session) = self.sessions.borrow_mut().remove(&text_id) else {
            return Ok(None);
        };
        session.armed = false;
        let members = std::mem::take(&mut session.pending_members);
        let old_group = session.group_id;

        let result = self.options.canvas.write(|s| {
            let present: Vec<ShapeId> = members
                .iter()
                .copied()
                .filter(|&id| s.get(id).is_some())
                .collect();
            for &id in &members {
                s.set_selectable(id, true);
                s.widgets.remove(id);
            }
            let group_id = s.document.group_in_order(&present, GroupOptions::default());
            // Custom attributes follow the group to its new id.
            if let Some(attributes) = s.document.attributes.remove(&old_group) {
                if let Some(new_group) = group_id {
                    s.document.attributes.insert(new_group, attributes);
                }
            }
            s.render_all();
            (present, group_id)
        });
        // The signal must fire even when the surface is gone.
        session.signal.borrow_mut().complete(completion);
        let (present, group_id) = result?;

        if present.len() != members.len() {
            log::warn!(
                "{} member(s) of group {} disappeared while editing",
                members.len() - present.len(),
                session.group_id
            );
        }
        match group_id {
            Some(group_id) => {
                log::debug!("Regrouped {} member(s) as {}", present.len(), group_id);
                self.options.emit(EditorEvent::GroupReformed {
                    group_id,
                    members: present,
                });
            }
            None => log::warn!("Nothing left to regroup for {}", text_id),
        }
        self.options.emit(EditorEvent::ObjectsChanged);
        self.options.sync_selection()?;
        Ok(group_id)
    }
}
