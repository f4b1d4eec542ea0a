use diesel::prelude::*;

use crate::domain::training_record::{
    NewTrainingRecord as DomainNewTrainingRecord, TrainingRecord,
};
use crate::domain::types::{PostUrl, TrainingRecordId};
use crate::embedding::encode_embedding;
use crate::models::training_record::{
    NewTrainingRecord as DbNewTrainingRecord, TrainingRecord as DbTrainingRecord,
};
use crate::repository::{
    DieselRepository, RepositoryResult, TrainingRecordListQuery, TrainingRecordReader,
    TrainingRecordWriter,
};

impl TrainingRecordReader for DieselRepository {
    fn get_record_by_url(&self, url: &PostUrl) -> RepositoryResult<Option<TrainingRecord>> {
        use crate::schema::engagement_training_data;

        let mut conn = self.conn()?;

        let result = engagement_training_data::table
            .filter(engagement_training_data::post_url.eq(url.as_str()))
            .first::<DbTrainingRecord>(&mut conn)
            .optional()?;

        let result = result.map(TryInto::try_into).transpose()?;
        Ok(result)
    }

    fn list_records(
        &self,
        query: TrainingRecordListQuery,
    ) -> RepositoryResult<Vec<TrainingRecord>> {
        use crate::schema::engagement_training_data;

        let mut conn = self.conn()?;

        let mut items = engagement_training_data::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(labeled) = query.labeled {
            items = items.filter(engagement_training_data::is_labeled.eq(labeled));
        }

        match query.has_embedding {
            Some(true) => {
                items = items.filter(engagement_training_data::caption_embedding.is_not_null())
            }
            Some(false) => {
                items = items.filter(engagement_training_data::caption_embedding.is_null())
            }
            None => {}
        }

        match query.has_caption {
            Some(true) => items = items.filter(engagement_training_data::caption.is_not_null()),
            Some(false) => items = items.filter(engagement_training_data::caption.is_null()),
            None => {}
        }

        // Rows that fail domain validation are logged and left out.
        let results = items
            .order(engagement_training_data::id.asc())
            .load::<DbTrainingRecord>(&mut conn)?
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                match TrainingRecord::try_from(row) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        log::error!("Skipping training record {id}: {e}");
                        None
                    }
                }
            })
            .collect();

        Ok(results)
    }
}

impl TrainingRecordWriter for DieselRepository {
    fn create_record(&self, record: &DomainNewTrainingRecord) -> RepositoryResult<usize> {
        use crate::schema::engagement_training_data;

        let mut conn = self.conn()?;

        let db_record: DbNewTrainingRecord = record.into();

        let affected = diesel::insert_into(engagement_training_data::table)
            .values(&db_record)
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_caption_embedding(
        &self,
        id: TrainingRecordId,
        embedding: &[f32],
    ) -> RepositoryResult<usize> {
        use crate::schema::engagement_training_data;

        let mut conn = self.conn()?;

        let affected = diesel::update(
            engagement_training_data::table.filter(engagement_training_data::id.eq(id.get())),
        )
        .set(engagement_training_data::caption_embedding.eq(Some(encode_embedding(embedding))))
        .execute(&mut conn)?;

        Ok(affected)
    }
}
