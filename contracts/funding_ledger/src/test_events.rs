extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger as _},
    token, vec, Address, Env, IntoVal, String, Symbol, TryIntoVal, Val, Vec,
};

use crate::events::{
    AdminChanged, FeesWithdrawn, FundsClaimed, ProjectCompleted, ProjectContributed,
    ProjectCreated, ProjectWithdrawn,
};
use crate::{FundingLedger, FundingLedgerClient};

const UNIT: i128 = 10_000_000;
const CREATION_FEE: i128 = UNIT / 100;

fn setup() -> (Env, FundingLedgerClient<'static>, Address, token::StellarAssetClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    let admin = Address::generate(&env);
    let token_admin = Address::generate(&env);
    let sac = env.register_stellar_asset_contract_v2(token_admin);
    let sac_client = token::StellarAssetClient::new(&env, &sac.address());

    let contract_id = env.register(FundingLedger, ());
    let client = FundingLedgerClient::new(&env, &contract_id);
    client.init(&admin, &sac.address(), &CREATION_FEE, &5, &10);
    (env, client, admin, sac_client)
}

fn funded(env: &Env, sac: &token::StellarAssetClient, amount: i128) -> Address {
    let address = Address::generate(env);
    sac.mint(&address, &amount);
    address
}

fn create(
    env: &Env,
    client: &FundingLedgerClient,
    owner: &Address,
    goal: i128,
    duration: u64,
) -> u64 {
    client.create_project(
        owner,
        &String::from_str(env, "Project A"),
        &String::from_str(env, "Desc"),
        &String::from_str(env, "https://example.com"),
        &goal,
        &duration,
        &CREATION_FEE,
    )
}

/// Events published by the ledger itself, skipping token transfer events.
fn ledger_events(env: &Env, client: &FundingLedgerClient) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(contract, _, _)| *contract == client.address)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

fn first_topic_is(env: &Env, topics: &Vec<Val>, name: Symbol) -> bool {
    topics
        .get(0)
        .and_then(|t| TryIntoVal::<Env, Symbol>::try_into_val(&t, env).ok())
        .map(|s| s == name)
        .unwrap_or(false)
}

#[test]
fn test_project_created_event() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);

    let id = create(&env, &client, &owner, UNIT, 86_400);

    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");

    let expected_topics = vec![
        &env,
        symbol_short!("created").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(*topics, expected_topics);

    let event_data: ProjectCreated = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProjectCreated {
            project_id: id,
            owner,
            name: String::from_str(&env, "Project A"),
            funding_goal: UNIT,
            url: String::from_str(&env, "https://example.com"),
            deadline: env.ledger().timestamp() + 86_400,
        }
    );
}

#[test]
fn test_project_contributed_event() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let contributor = funded(&env, &sac, UNIT);
    let id = create(&env, &client, &owner, UNIT, 86_400);

    client.contribute(&contributor, &id, &(UNIT / 5));

    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");

    let expected_topics = vec![
        &env,
        symbol_short!("contrib").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(*topics, expected_topics);

    let event_data: ProjectContributed = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProjectContributed {
            project_id: id,
            contributor,
            net_amount: 1_900_000,
        }
    );
}

#[test]
fn test_crossing_contribution_emits_completed_after_contributed() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let contributor = funded(&env, &sac, 3 * UNIT);
    let id = create(&env, &client, &owner, UNIT, 86_400);

    client.contribute(&contributor, &id, &(2 * UNIT));

    let events = ledger_events(&env, &client);
    assert!(events.len() >= 2);
    let (contrib_topics, _) = &events[events.len() - 2];
    let (topics, data) = &events[events.len() - 1];

    assert_eq!(
        *contrib_topics,
        vec![&env, symbol_short!("contrib").into_val(&env), id.into_val(&env)]
    );
    assert_eq!(
        *topics,
        vec![&env, symbol_short!("completed").into_val(&env), id.into_val(&env)]
    );
    let event_data: ProjectCompleted = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProjectCompleted {
            project_id: id,
            total_funds: 19_000_000,
        }
    );
}

#[test]
fn test_contribution_below_goal_emits_no_completion() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let contributor = funded(&env, &sac, UNIT);
    let id = create(&env, &client, &owner, UNIT, 86_400);

    client.contribute(&contributor, &id, &(UNIT / 2));

    let any_completed = ledger_events(&env, &client)
        .iter()
        .any(|(topics, _)| first_topic_is(&env, topics, symbol_short!("completed")));
    assert!(!any_completed);
}

#[test]
fn test_project_withdrawn_event() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let contributor = funded(&env, &sac, UNIT);
    let id = create(&env, &client, &owner, UNIT, 86_400);
    client.contribute(&contributor, &id, &(UNIT / 2));
    let fee = client.get_early_withdrawal_fee(&id);

    client.withdraw_early(&owner, &id, &fee);

    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");
    assert_eq!(
        *topics,
        vec![&env, symbol_short!("withdrawn").into_val(&env), id.into_val(&env)]
    );
    let event_data: ProjectWithdrawn = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        ProjectWithdrawn {
            project_id: id,
            owner,
            amount: 4_750_000,
            fee: 475_000,
        }
    );
}

#[test]
fn test_project_expired_events() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let first = create(&env, &client, &owner, UNIT, 1);
    let second = create(&env, &client, &owner, UNIT, 1);
    create(&env, &client, &owner, UNIT, 86_400);

    env.ledger().set_timestamp(env.ledger().timestamp() + 2);
    client.update_project_status();

    let ids: std::vec::Vec<u64> = ledger_events(&env, &client)
        .into_iter()
        .filter(|(topics, _)| first_topic_is(&env, topics, symbol_short!("expired")))
        .map(|(_, data)| data.try_into_val(&env).unwrap())
        .collect();
    assert_eq!(ids, std::vec![first, second]);
}

#[test]
fn test_funds_claimed_event() {
    let (env, client, _, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    let contributor = funded(&env, &sac, 3 * UNIT);
    let id = create(&env, &client, &owner, UNIT, 86_400);
    client.contribute(&contributor, &id, &(2 * UNIT));

    client.claim_funds(&owner, &id);

    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");
    assert_eq!(
        *topics,
        vec![&env, symbol_short!("claimed").into_val(&env), id.into_val(&env)]
    );
    let event_data: FundsClaimed = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        FundsClaimed {
            project_id: id,
            owner,
            amount: 19_000_000,
        }
    );
}

#[test]
fn test_fee_admin_events() {
    let (env, client, admin, sac) = setup();
    let owner = funded(&env, &sac, UNIT);
    create(&env, &client, &owner, UNIT, 86_400);

    client.set_contribution_fee(&admin, &7);
    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");
    assert_eq!(
        *topics,
        vec![
            &env,
            symbol_short!("fee_set").into_val(&env),
            symbol_short!("contrib").into_val(&env)
        ]
    );
    let pct: u32 = data.try_into_val(&env).unwrap();
    assert_eq!(pct, 7);

    client.set_creation_fee(&admin, &(UNIT / 10));
    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");
    assert_eq!(
        *topics,
        vec![
            &env,
            symbol_short!("fee_set").into_val(&env),
            symbol_short!("creation").into_val(&env)
        ]
    );
    let fee: i128 = data.try_into_val(&env).unwrap();
    assert_eq!(fee, UNIT / 10);

    let sink = Address::generate(&env);
    client.withdraw_fees(&admin, &sink, &CREATION_FEE);
    let events = ledger_events(&env, &client);
    let (topics, data) = events.last().expect("No events found");
    assert_eq!(*topics, vec![&env, symbol_short!("fees_out").into_val(&env)]);
    let event_data: FeesWithdrawn = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        FeesWithdrawn {
            to: sink,
            amount: CREATION_FEE,
        }
    );

    let next = Address::generate(&env);
    client.transfer_admin(&admin, &next);
    let events = ledger_events(&env, &client);
    let (_, data) = events.last().expect("No events found");
    let event_data: AdminChanged = data.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        AdminChanged {
            old_admin: admin,
            new_admin: next,
        }
    );
}
