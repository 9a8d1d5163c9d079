// Costumes and the sprite's ordered costume list.
// Visual: the current costume is what stands in the middle of the stage;
// captures insert new ones, X deletes, F/G flip, arrows browse.

use image::imageops;

use crate::error::{Error, Result};
use crate::types::{pack_argb, FrameBuffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flip {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug)]
pub struct Costume {
    pub name: String,
    pub image: FrameBuffer,
    /// Image pixels per logical stage unit (2 for captured costumes).
    pub bitmap_resolution: u32,
    /// Pivot in image pixels; defaults to the image centre.
    pub rotation_center: (f64, f64),
}

impl Costume {
    pub fn new(name: impl Into<String>, image: FrameBuffer, bitmap_resolution: u32) -> Self {
        let rotation_center = (image.width as f64 / 2.0, image.height as f64 / 2.0);
        Self {
            name: name.into(),
            image,
            bitmap_resolution: bitmap_resolution.max(1),
            rotation_center,
        }
    }

    /// Size on the stage, in logical units.
    pub fn size(&self) -> (f64, f64) {
        let res = self.bitmap_resolution as f64;
        (self.image.width as f64 / res, self.image.height as f64 / res)
    }

    /// Mirror the image in place; the pivot is mirrored with it.
    pub fn flip(&mut self, flip: Flip) {
        let img = self.image.to_rgba_image();
        let flipped = match flip {
            Flip::Horizontal => imageops::flip_horizontal(&img),
            Flip::Vertical => imageops::flip_vertical(&img),
        };
        self.image = FrameBuffer::from_rgba_image(&flipped);
        match flip {
            Flip::Horizontal => self.rotation_center.0 = self.image.width as f64 - self.rotation_center.0,
            Flip::Vertical => self.rotation_center.1 = self.image.height as f64 - self.rotation_center.1,
        }
    }
}

/// Default costume for a fresh sprite: a small filled disc.
pub fn default_costume(bitmap_resolution: u32) -> Costume {
    let d = 32 * bitmap_resolution.max(1) as usize;
    let r = d as f64 / 2.0;
    let mut fb = FrameBuffer::new(d, d, 0);
    for y in 0..d {
        for x in 0..d {
            let dx = x as f64 + 0.5 - r;
            let dy = y as f64 + 0.5 - r;
            if dx * dx + dy * dy <= r * r {
                fb.pixels[y * d + x] = pack_argb(0xFF, 0xAB, 0x19, 0xFF);
            }
        }
    }
    Costume::new("costume1", fb, bitmap_resolution)
}

/// Ordered costume list; never empty.
pub struct Sprite {
    costumes: Vec<Costume>,
    current: usize,
}

impl Sprite {
    pub fn new(first: Costume) -> Self {
        Self { costumes: vec![first], current: 0 }
    }

    pub fn len(&self) -> usize {
        self.costumes.len()
    }

    pub fn costumes(&self) -> &[Costume] {
        &self.costumes
    }

    pub fn current(&self) -> &Costume {
        &self.costumes[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Costume {
        &mut self.costumes[self.current]
    }

    /// 1-based position of the current costume.
    pub fn current_number(&self) -> usize {
        self.current + 1
    }

    /// Make the costume at a 1-based position current; false if out of range.
    pub fn select(&mut self, number: usize) -> bool {
        if number == 0 || number > self.costumes.len() {
            return false;
        }
        self.current = number - 1;
        true
    }

    pub fn select_next(&mut self) {
        self.current = (self.current + 1) % self.costumes.len();
    }

    pub fn select_previous(&mut self) {
        let n = self.costumes.len();
        self.current = (self.current + n - 1) % n;
    }

    /// Name at a 1-based index; `None` outside `1..=len`.
    /// Fractional indexes are rounded, the same way `index_of` treats numbers.
    pub fn name_at(&self, index: f64) -> Option<&str> {
        let index = index.round();
        if !(index >= 1.0 && index <= self.costumes.len() as f64) {
            return None;
        }
        Some(&self.costumes[index as usize - 1].name)
    }

    /// Resolve a costume argument: an exact name wins, otherwise a number is
    /// taken as a 1-based index (rounded).
    pub fn index_of(&self, name_or_number: &str) -> Option<usize> {
        if let Some(i) = self.costumes.iter().position(|c| c.name == name_or_number) {
            return Some(i);
        }
        let n: f64 = name_or_number.trim().parse().ok()?;
        if !n.is_finite() {
            return None;
        }
        let n = n.round();
        if n >= 1.0 && n <= self.costumes.len() as f64 {
            Some(n as usize - 1)
        } else {
            None
        }
    }

    /// Insert at a 1-based position (clamped to `1..=len+1`, `None` appends).
    /// The name is made unique. Returns the 1-based position used.
    pub fn insert(&mut self, mut costume: Costume, at: Option<f64>) -> usize {
        costume.name = self.unused_name(&costume.name);
        let last = self.costumes.len() + 1;
        let pos = match at {
            Some(v) if v.is_finite() => (v.round().max(1.0) as usize).min(last),
            _ => last,
        };
        let idx = pos - 1;
        if pos != last && idx <= self.current {
            self.current += 1; // keep pointing at the same costume
        }
        log::info!("inserted costume '{}' at {}", costume.name, pos);
        self.costumes.insert(idx, costume);
        pos
    }

    /// Delete by name or 1-based number. The last costume cannot be removed.
    pub fn delete(&mut self, name_or_number: &str) -> Result<Costume> {
        if self.costumes.len() <= 1 {
            return Err(Error::LastCostume);
        }
        let idx = self
            .index_of(name_or_number)
            .ok_or_else(|| Error::CostumeNotFound(name_or_number.to_string()))?;
        Ok(self.remove_index(idx))
    }

    /// Delete by 1-based position only; names never take part.
    pub fn delete_at(&mut self, number: usize) -> Result<Costume> {
        if self.costumes.len() <= 1 {
            return Err(Error::LastCostume);
        }
        if number == 0 || number > self.costumes.len() {
            return Err(Error::CostumeNotFound(format!("#{number}")));
        }
        Ok(self.remove_index(number - 1))
    }

    fn remove_index(&mut self, idx: usize) -> Costume {
        let removed = self.costumes.remove(idx);
        if idx < self.current || self.current >= self.costumes.len() {
            self.current = self.current.saturating_sub(1);
        }
        log::info!("deleted costume '{}'", removed.name);
        removed
    }

    fn unused_name(&self, wanted: &str) -> String {
        let taken = |n: &str| self.costumes.iter().any(|c| c.name == n);
        if !taken(wanted) {
            return wanted.to_string();
        }
        // Strip a trailing number so "costume2" continues as "costume3".
        let base = wanted.trim_end_matches(|c: char| c.is_ascii_digit());
        let base = if base.is_empty() { wanted } else { base };
        (2..)
            .map(|i| format!("{base}{i}"))
            .find(|n| !taken(n))
            .unwrap_or_else(|| wanted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Costume {
        Costume::new(name, FrameBuffer::new(4, 2, 0xFF00_0000), 2)
    }

    fn sprite(names: &[&str]) -> Sprite {
        let mut s = Sprite::new(named(names[0]));
        for n in &names[1..] {
            s.insert(named(n), None);
        }
        s
    }

    fn names(s: &Sprite) -> Vec<&str> {
        s.costumes().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn length_and_name_at() {
        let s = sprite(&["costume1", "costume2", "costume3"]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.name_at(2.0), Some("costume2"));
        assert_eq!(s.name_at(5.0), None);
        assert_eq!(s.name_at(0.0), None);
        assert_eq!(s.name_at(f64::NAN), None);
        assert_eq!(s.name_at(1.5), Some("costume2"));
        assert_eq!(s.name_at(1.4), Some("costume1"));
        assert_eq!(s.name_at(3.6), None);
    }

    #[test]
    fn index_prefers_name_over_number() {
        let s = sprite(&["a", "1", "b"]);
        assert_eq!(s.index_of("1"), Some(1)); // the costume named "1"
        assert_eq!(s.index_of("3"), Some(2));
        assert_eq!(s.index_of("2.6"), Some(2));
        assert_eq!(s.index_of("4"), None);
        assert_eq!(s.index_of("zzz"), None);
    }

    #[test]
    fn insert_clamps_and_renames() {
        let mut s = sprite(&["costume1"]);
        assert_eq!(s.insert(named("snap"), Some(-4.0)), 1);
        assert_eq!(s.insert(named("snap"), Some(99.0)), 3);
        assert_eq!(s.insert(named("costume1"), Some(2.0)), 2);
        assert_eq!(names(&s), ["snap", "costume2", "costume1", "snap2"]);
        // Current stayed on the original costume.
        assert_eq!(s.current().name, "costume1");
    }

    #[test]
    fn delete_keeps_one_costume() {
        let mut s = sprite(&["a"]);
        assert!(matches!(s.delete("a"), Err(Error::LastCostume)));

        let mut s = sprite(&["a", "b", "c"]);
        assert!(matches!(s.delete("nope"), Err(Error::CostumeNotFound(_))));
        assert_eq!(s.delete("2").unwrap().name, "b");
        assert_eq!(names(&s), ["a", "c"]);
    }

    #[test]
    fn delete_keeps_current_valid() {
        let mut s = sprite(&["a", "b", "c"]);
        s.select_previous(); // wraps to "c"
        assert_eq!(s.current().name, "c");
        s.delete("c").unwrap();
        assert_eq!(s.current().name, "b");
        s.delete("a").unwrap();
        assert_eq!(s.current().name, "b");
        assert_eq!(s.current_number(), 1);
    }

    #[test]
    fn delete_at_ignores_numeric_names() {
        let mut s = sprite(&["2", "a"]);
        assert!(s.select(2));
        assert_eq!(s.delete_at(2).unwrap().name, "a");
        assert_eq!(names(&s), ["2"]);
        assert_eq!(s.current().name, "2");

        assert!(matches!(s.delete_at(1), Err(Error::LastCostume)));
        let mut s = sprite(&["a", "b"]);
        assert!(matches!(s.delete_at(3), Err(Error::CostumeNotFound(_))));
        assert!(matches!(s.delete_at(0), Err(Error::CostumeNotFound(_))));
    }

    #[test]
    fn select_by_number() {
        let mut s = sprite(&["a", "b"]);
        assert!(s.select(2));
        assert_eq!(s.current().name, "b");
        assert!(!s.select(0));
        assert!(!s.select(3));
        s.select_next();
        assert_eq!(s.current().name, "a");
    }

    #[test]
    fn size_is_in_logical_units() {
        let c = Costume::new("c", FrameBuffer::new(40, 30, 0), 2);
        assert_eq!(c.size(), (20.0, 15.0));
    }

    #[test]
    fn flip_mirrors_pixels_and_pivot() {
        let mut c = Costume::new(
            "c",
            FrameBuffer { width: 2, height: 1, pixels: vec![0xFF00_0001, 0xFF00_0002] },
            1,
        );
        c.rotation_center = (0.5, 0.0);
        c.flip(Flip::Horizontal);
        assert_eq!(c.image.pixels, vec![0xFF00_0002, 0xFF00_0001]);
        assert_eq!(c.rotation_center, (1.5, 0.0));

        c.flip(Flip::Vertical); // single row: pixels unchanged
        assert_eq!(c.image.pixels, vec![0xFF00_0002, 0xFF00_0001]);
        assert_eq!(c.rotation_center, (1.5, 1.0));
    }
}
