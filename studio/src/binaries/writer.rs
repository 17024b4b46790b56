//! Little-endian buffer builder for tests. There is no encoder, so synthetic files
//! are laid out by hand with this.

use glam::{Vec2, Vec3};

#[derive(Default)]
pub struct ByteWriter {
    pub data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn get_offset(&self) -> usize {
        self.data.len()
    }

    pub fn append_i32(&mut self, i: i32) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_u8(&mut self, i: u8) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_i8(&mut self, i: i8) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_i16(&mut self, i: i16) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_u16(&mut self, i: u16) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_f32(&mut self, i: f32) {
        self.data.extend(i.to_le_bytes());
    }

    pub fn append_vec2(&mut self, v: Vec2) {
        self.append_f32(v.x);
        self.append_f32(v.y);
    }

    pub fn append_vec3(&mut self, v: Vec3) {
        self.append_f32(v.x);
        self.append_f32(v.y);
        self.append_f32(v.z);
    }

    pub fn append_u8_slice(&mut self, i: &[u8]) {
        self.data.extend_from_slice(i);
    }

    pub fn append_zeroes(&mut self, n: usize) {
        self.data.resize(self.data.len() + n, 0);
    }

    /// Appends `s` without a terminator.
    pub fn append_string(&mut self, s: &str) {
        self.data.extend(s.as_bytes());
    }

    /// Appends `s` and a terminator, returning where it starts.
    pub fn append_cstr(&mut self, s: &str) -> usize {
        let at = self.get_offset();
        self.append_string(s);
        self.append_u8(0);
        at
    }

    pub fn replace(&mut self, start: usize, slice: &[u8]) {
        self.data[start..start + slice.len()].copy_from_slice(slice);
    }

    pub fn replace_with_i32(&mut self, start: usize, val: i32) {
        self.replace(start, &val.to_le_bytes());
    }

    pub fn replace_with_f32(&mut self, start: usize, val: f32) {
        self.replace(start, &val.to_le_bytes());
    }
}
