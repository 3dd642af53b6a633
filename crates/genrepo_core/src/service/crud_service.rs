//! Generic CRUD service over one unit of work.
//!
//! # Invariants
//! - Every call runs in the service's single transaction.
//! - Changes persist only after `commit()`.

use crate::model::Model;
use crate::predicate::Predicate;
use crate::repo::crud_repo::{CrudRepository, RepoResult};
use crate::uow::UnitOfWork;
use std::marker::PhantomData;

/// Use-case entry point for one model type.
pub struct CrudService<M: Model> {
    uow: UnitOfWork,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> CrudService<M> {
    pub fn new(uow: UnitOfWork) -> Self {
        Self {
            uow,
            _model: PhantomData,
        }
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }

    pub fn get_all(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Vec<M>> {
        self.uow.repository::<M>().get_all(predicate)
    }

    pub fn get(&mut self, predicate: Option<&Predicate<M::Record>>) -> RepoResult<Option<M>> {
        self.uow.repository::<M>().get(predicate)
    }

    pub fn create(&mut self, model: &M) -> RepoResult<usize> {
        self.uow.repository::<M>().create(model)
    }

    pub fn update(&mut self, model: &M, predicate: &Predicate<M::Record>) -> RepoResult<usize> {
        self.uow.repository::<M>().update(model, predicate)
    }

    pub fn delete(&mut self, predicate: &Predicate<M::Record>) -> RepoResult<usize> {
        self.uow.repository::<M>().delete(predicate)
    }

    pub fn commit(&mut self) -> RepoResult<()> {
        self.uow.commit()
    }

    pub fn dispose(&mut self) {
        self.uow.dispose();
    }
}
