use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug, Eq, PartialEq, Clone)]
pub struct File {
    pub path: Option<PathBuf>,
    pub text: String,
}

impl File {
    pub fn read(path: &Path) -> io::Result<File> {
        Ok(File {
            text: fs::read_to_string(path)?,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn mem(text: &str) -> File {
        File {
            path: None,
            text: text.to_string(),
        }
    }

    pub fn name(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or("<stream>".into())
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem() {
        let f = File::mem("2000/01/01 foo\n  Assets $1\r\n  Equity\n");
        assert_eq!(f.name(), "<stream>");
        assert_eq!(
            f.lines().collect::<Vec<_>>(),
            vec!["2000/01/01 foo", "  Assets $1", "  Equity"]
        );
    }
}
