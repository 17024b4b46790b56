// for an item models/x/y/z.dx90.vtx
pub trait VPath {
    // return vtx
    fn ext(&self) -> &str;
    // return z.dx90
    fn filename(&self) -> &str;

    fn dir(&self) -> String;
}

/// A path relative to the search root, such as `models/props_c17/bench01a.mdl`.
#[derive(Copy, Clone, Debug)]
pub struct VGlobalPath<'a> {
    path: &'a str,
}

impl<'a> VGlobalPath<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { path }
    }

    fn last_sep(&self) -> Option<usize> {
        self.path.rfind(['/', '\\'])
    }

    /// Index of the extension separator, ignoring dots in directory names
    fn ext_sep(&self) -> Option<usize> {
        let ext_sep = self.path.rfind('.')?;
        match self.last_sep() {
            Some(last_sep) if last_sep > ext_sep => None,
            _ => Some(ext_sep),
        }
    }

    /// The path with its final extension removed, `models/x/y/z.dx90`.
    pub fn stem(&self) -> &'a str {
        match self.ext_sep() {
            Some(ext_sep) => &self.path[..ext_sep],
            None => self.path,
        }
    }

    /// Replaces the final extension. An empty `ext` drops it.
    pub fn with_ext(&self, ext: &str) -> String {
        if ext.is_empty() {
            self.stem().to_owned()
        } else {
            format!("{}.{}", self.stem(), ext)
        }
    }
}

impl<'a> From<&'a str> for VGlobalPath<'a> {
    fn from(value: &'a str) -> Self {
        VGlobalPath { path: value }
    }
}

impl<'a> VPath for VGlobalPath<'a> {
    fn ext(&self) -> &str {
        if let Some(ext_sep) = self.ext_sep() {
            &self.path[ext_sep + 1..]
        } else {
            ""
        }
    }

    fn filename(&self) -> &str {
        let start = self.last_sep().map_or(0, |last_sep| last_sep + 1);
        match self.ext_sep() {
            Some(ext_sep) => &self.path[start..ext_sep],
            None => &self.path[start..],
        }
    }

    fn dir(&self) -> String {
        if let Some(last_sep) = self.last_sep() {
            self.path[..last_sep].replace('\\', "/")
        } else {
            "".to_owned()
        }
    }
}
