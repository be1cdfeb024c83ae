use crate::areas::repository::Repository;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::object::Object;
use std::io::Write;

impl Repository {
    pub fn hash_object(&mut self, file: &str, write: bool) -> anyhow::Result<()> {
        let content = self.workspace().read_file(file.as_ref())?;
        let blob = Blob::new(content);

        let object_id = match write {
            true => self.database().store(&blob)?,
            false => blob.object_id()?,
        };

        writeln!(self.writer(), "{}", object_id)?;

        Ok(())
    }
}
