//! Shared application state: the store plus the core components wired over
//! it. Components are constructor-injected so tests can run them against
//! in-memory fakes.

use std::sync::Arc;

use actix_web::web::Data;

use crate::fault::FaultHandler;
use crate::manager::NodeManager;
use crate::runtime::NodeRuntime;
use crate::scheduler::Scheduler;
use crate::store::Store;

/// Thread safe wrapper
pub type State = Data<Fleet>;

pub struct Fleet {
    pub store: Arc<dyn Store>,
    pub manager: NodeManager,
    pub scheduler: Scheduler,
    pub faults: FaultHandler,
}

pub fn new_state(store: Arc<dyn Store>, runtime: Arc<dyn NodeRuntime>) -> State {
    let manager = NodeManager::new(store.clone(), runtime);
    let scheduler = Scheduler::new(store.clone());
    let faults = FaultHandler::new(store.clone(), manager.clone());
    Data::new(Fleet {
        store,
        manager,
        scheduler,
        faults,
    })
}
