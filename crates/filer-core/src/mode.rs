//! Open flags and permissions passed to a file backend.

/// How a file should be opened.
///
/// Mirrors the flag set of [`std::fs::OpenOptions`] plus the permission bits
/// applied when the file is created, so that backends other than the OS one
/// can inspect the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
    pub create_new: bool,
    /// Permission bits for newly created files (ignored on non-unix platforms).
    pub permissions: u32,
}

impl OpenMode {
    /// Default permission bits for created files, before the umask.
    pub const DEFAULT_PERMISSIONS: u32 = 0o666;

    /// Permission bits used for temporary files.
    pub const TEMP_PERMISSIONS: u32 = 0o600;

    /// Open an existing file for reading only.
    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            append: false,
            truncate: false,
            create: false,
            create_new: false,
            permissions: Self::DEFAULT_PERMISSIONS,
        }
    }

    /// Create a new file for reading and writing, failing if it already exists.
    pub const fn exclusive_create() -> Self {
        Self {
            read: true,
            write: true,
            append: false,
            truncate: false,
            create: false,
            create_new: true,
            permissions: Self::TEMP_PERMISSIONS,
        }
    }

    pub const fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub const fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    pub const fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub const fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub const fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub const fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    pub const fn permissions(mut self, permissions: u32) -> Self {
        self.permissions = permissions;
        self
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::read_only()
    }
}
