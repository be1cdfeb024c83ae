use crate::areas::repository::Repository;
use std::io::Write;

impl Repository {
    pub fn cat_file(&mut self, object: &str) -> anyhow::Result<()> {
        let object_id = self.database().resolve_prefix(object)?;
        let (_, payload) = self.database().load_payload(&object_id)?;

        self.writer().write_all(&payload)?;

        Ok(())
    }
}
