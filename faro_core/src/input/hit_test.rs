use crate::part_arena::PartArena;
use crate::parts::InteractionState;
use crate::structs2d::Vector2;
use faro_ids::{PartId, SoundId};

/// Per-frame pointer resolution over the part tree.
///
/// Holds the press/hover protocol state that spans frames: which part took
/// the press, the previous button state, and the last registered click.
#[derive(Debug, Default)]
pub struct HitTester {
    pub session_open: bool,
    /// Part that received the current press ("click-down" part)
    pub pressed: Option<PartId>,
    was_down: bool,
    pub last_clicked: Option<PartId>,
}

/// Side effects of one hit-test frame, applied by the engine afterwards
#[derive(Debug, Default)]
pub struct HitOutcome {
    /// Companion parts whose highlight needs a redraw
    pub dirty_links: Vec<PartId>,
    pub sounds: Vec<SoundId>,
    pub clicked: Option<PartId>,
}

impl HitTester {
    /// Resolve hover/click for every clickable part, in tree order.
    ///
    /// A press is remembered on its part; while held over the same part the
    /// state is Clicked, hovering without a matching press is Hovered (with
    /// the hover sound once per enter), leaving resets to Default. A release
    /// still over the pressed part registers the click: click sound instead
    /// of the hover sound, and the id is recorded.
    pub fn run_frame(
        &mut self,
        arena: &mut PartArena,
        order: &[PartId],
        mouse: Vector2,
        down: bool,
    ) -> HitOutcome {
        let mut outcome = HitOutcome::default();
        let pressed_edge = down && !self.was_down;
        let release_edge = !down && self.was_down;

        for &id in order {
            let Some(part) = arena.get_mut(id) else { continue };
            if !part.clickable || !part.global.visible {
                continue;
            }

            let over = part.hit_box.translated(part.global.pos).contains(mouse);
            let was_hovered = part.hovered;

            if over {
                if pressed_edge && self.pressed.is_none() {
                    self.pressed = Some(id);
                }

                let mut clicked_now = false;
                if release_edge && self.pressed == Some(id) {
                    self.last_clicked = Some(id);
                    outcome.clicked = Some(id);
                    if let Some(sound) = part.click_sound {
                        outcome.sounds.push(sound);
                    }
                    clicked_now = true;
                }

                if down && self.pressed == Some(id) {
                    part.state = InteractionState::Clicked;
                } else {
                    part.state = InteractionState::Hovered;
                    if !was_hovered && !clicked_now {
                        if let Some(sound) = part.cursor_sound {
                            outcome.sounds.push(sound);
                        }
                    }
                }

                part.hovered = true;
                if !was_hovered {
                    if let Some(link) = part.link {
                        outcome.dirty_links.push(link);
                    }
                }
            } else {
                part.state = InteractionState::Default;
                part.hovered = false;
                if was_hovered {
                    if let Some(link) = part.link {
                        outcome.dirty_links.push(link);
                    }
                }
            }
        }

        if release_edge {
            self.pressed = None;
        }
        self.was_down = down;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::Part;
    use crate::structs2d::Rect;

    fn button(id: u32, x: f32, y: f32) -> Part {
        let mut part = Part::new(PartId::new(id));
        part.clickable = true;
        part.global.pos = Vector2::new(x, y);
        part.hit_box = Rect::new(0.0, 0.0, 20.0, 20.0);
        part.cursor_sound = Some(SoundId::new(100 + id));
        part.click_sound = Some(SoundId::new(200 + id));
        part
    }

    fn fixture() -> (PartArena, Vec<PartId>) {
        let mut arena = PartArena::new();
        arena.insert(PartId::new(1), button(1, 0.0, 0.0));
        arena.insert(PartId::new(2), button(2, 100.0, 0.0));
        (arena, vec![PartId::new(1), PartId::new(2)])
    }

    #[test]
    fn press_and_release_over_part_clicks_once() {
        let (mut arena, order) = fixture();
        let mut hit = HitTester::default();
        let p = Vector2::new(5.0, 5.0);

        hit.run_frame(&mut arena, &order, p, true);
        assert_eq!(arena.get(PartId::new(1)).unwrap().state, InteractionState::Clicked);

        let outcome = hit.run_frame(&mut arena, &order, p, false);
        assert_eq!(outcome.clicked, Some(PartId::new(1)));
        assert_eq!(hit.last_clicked, Some(PartId::new(1)));
        // click sound, not the hover sound
        assert_eq!(outcome.sounds, vec![SoundId::new(201)]);

        // nothing further without a new press
        let outcome = hit.run_frame(&mut arena, &order, p, false);
        assert_eq!(outcome.clicked, None);
        assert_eq!(hit.last_clicked, Some(PartId::new(1)));
    }

    #[test]
    fn drag_off_cancels_click() {
        let (mut arena, order) = fixture();
        let mut hit = HitTester::default();

        hit.run_frame(&mut arena, &order, Vector2::new(5.0, 5.0), true);
        hit.run_frame(&mut arena, &order, Vector2::new(50.0, 50.0), true);
        assert_eq!(arena.get(PartId::new(1)).unwrap().state, InteractionState::Default);

        let outcome = hit.run_frame(&mut arena, &order, Vector2::new(50.0, 50.0), false);
        assert_eq!(outcome.clicked, None);
        assert_eq!(hit.last_clicked, None);
    }

    #[test]
    fn hover_sound_fires_once_per_enter() {
        let (mut arena, order) = fixture();
        let mut hit = HitTester::default();
        let p = Vector2::new(5.0, 5.0);

        let first = hit.run_frame(&mut arena, &order, p, false);
        assert_eq!(first.sounds, vec![SoundId::new(101)]);
        let second = hit.run_frame(&mut arena, &order, p, false);
        assert!(second.sounds.is_empty());

        // leave and re-enter
        hit.run_frame(&mut arena, &order, Vector2::new(50.0, 50.0), false);
        let third = hit.run_frame(&mut arena, &order, p, false);
        assert_eq!(third.sounds, vec![SoundId::new(101)]);
    }

    #[test]
    fn hover_while_holding_foreign_press() {
        let (mut arena, order) = fixture();
        let mut hit = HitTester::default();

        // press on part 1, drag over part 2 while held
        hit.run_frame(&mut arena, &order, Vector2::new(5.0, 5.0), true);
        hit.run_frame(&mut arena, &order, Vector2::new(105.0, 5.0), true);
        assert_eq!(arena.get(PartId::new(2)).unwrap().state, InteractionState::Hovered);

        // releasing over part 2 is not a click on it
        let outcome = hit.run_frame(&mut arena, &order, Vector2::new(105.0, 5.0), false);
        assert_eq!(outcome.clicked, None);
    }

    #[test]
    fn link_marked_on_enter_and_leave() {
        let (mut arena, order) = fixture();
        arena.get_mut(PartId::new(1)).unwrap().link = Some(PartId::new(2));
        let mut hit = HitTester::default();

        let enter = hit.run_frame(&mut arena, &order, Vector2::new(5.0, 5.0), false);
        assert_eq!(enter.dirty_links, vec![PartId::new(2)]);
        let stay = hit.run_frame(&mut arena, &order, Vector2::new(6.0, 5.0), false);
        assert!(stay.dirty_links.is_empty());
        let leave = hit.run_frame(&mut arena, &order, Vector2::new(50.0, 50.0), false);
        assert_eq!(leave.dirty_links, vec![PartId::new(2)]);
    }

    #[test]
    fn invisible_parts_ignore_pointer() {
        let (mut arena, order) = fixture();
        arena.get_mut(PartId::new(1)).unwrap().global.visible = false;
        let mut hit = HitTester::default();
        let outcome = hit.run_frame(&mut arena, &order, Vector2::new(5.0, 5.0), false);
        assert!(outcome.sounds.is_empty());
        assert_eq!(arena.get(PartId::new(1)).unwrap().state, InteractionState::Default);
    }
}
