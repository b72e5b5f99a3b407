use super::*;

fn list_query(status: Option<OrderStatus>, page: u32, limit: u32) -> OrderListQuery {
    OrderListQuery {
        page,
        limit,
        status,
    }
}

// ========================================================================
// Get
// ========================================================================

#[tokio::test]
async fn test_get_visible_to_participants_and_admin() {
    let f = create_test_fixture().await;
    let order = f.place_standard_order().await;

    for actor in [&f.customer, &f.artisan_a, &f.artisan_b, &f.admin] {
        let fetched = f.manager.get(actor, &order.id).await.unwrap();
        assert_eq!(fetched.id, order.id);
    }

    let err = f
        .manager
        .get(&f.other_customer, &order.id)
        .await
        .unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::NotOrderParticipant);

    let err = f.manager.get(&f.admin, "missing").await.unwrap_err();
    assert_eq!(app_error(err).code, ErrorCode::OrderNotFound);
}

// ========================================================================
// List
// ========================================================================

#[tokio::test]
async fn test_list_scoped_by_role() {
    let f = create_test_fixture().await;
    f.add_product("A", "art-a", 10, 50).await;
    f.add_product("B", "art-b", 10, 50).await;

    f.manager
        .create_order(&f.customer, cart(&[("A", 1)]))
        .await
        .unwrap();
    f.manager
        .create_order(&f.customer, cart(&[("B", 1)]))
        .await
        .unwrap();
    f.manager
        .create_order(&f.other_customer, cart(&[("A", 1), ("B", 1)]))
        .await
        .unwrap();

    let q = list_query(None, 1, 10);
    assert_eq!(f.manager.list(&f.customer, &q).await.unwrap().pagination.total, 2);
    assert_eq!(f.manager.list(&f.other_customer, &q).await.unwrap().pagination.total, 1);
    assert_eq!(f.manager.list(&f.artisan_a, &q).await.unwrap().pagination.total, 2);
    assert_eq!(f.manager.list(&f.artisan_b, &q).await.unwrap().pagination.total, 2);
    assert_eq!(f.manager.list(&f.admin, &q).await.unwrap().pagination.total, 3);

    let mine = f.manager.list(&f.customer, &q).await.unwrap();
    assert!(mine.items.iter().all(|o| o.customer_id == "cust-1"));
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let f = create_test_fixture().await;
    f.add_product("A", "art-a", 10, 50).await;
    let first = f
        .manager
        .create_order(&f.customer, cart(&[("A", 1)]))
        .await
        .unwrap();
    f.manager
        .create_order(&f.customer, cart(&[("A", 1)]))
        .await
        .unwrap();
    f.advance(&first.id, &f.artisan_a, OrderStatus::Confirmed).await;

    let confirmed = f
        .manager
        .list(&f.customer, &list_query(Some(OrderStatus::Confirmed), 1, 10))
        .await
        .unwrap();
    assert_eq!(confirmed.items.len(), 1);
    assert_eq!(confirmed.items[0].id, first.id);

    let pending = f
        .manager
        .list(&f.artisan_a, &list_query(Some(OrderStatus::Pending), 1, 10))
        .await
        .unwrap();
    assert_eq!(pending.pagination.total, 1);
}

#[tokio::test]
async fn test_list_paginates_newest_first() {
    let f = create_test_fixture().await;
    f.add_product("A", "art-a", 10, 50).await;
    let mut ids = Vec::new();
    for _ in 0..5 {
        let order = f
            .manager
            .create_order(&f.customer, cart(&[("A", 1)]))
            .await
            .unwrap();
        ids.push(order.id);
    }

    let page1 = f
        .manager
        .list(&f.customer, &list_query(None, 1, 2))
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.items[0].id, ids[4]);
    assert_eq!(page1.items[1].id, ids[3]);
    assert_eq!(page1.pagination.total, 5);
    assert_eq!(page1.pagination.total_pages, 3);

    let page3 = f
        .manager
        .list(&f.customer, &list_query(None, 3, 2))
        .await
        .unwrap();
    assert_eq!(page3.items.len(), 1);
    assert_eq!(page3.items[0].id, ids[0]);

    let beyond = f
        .manager
        .list(&f.customer, &list_query(None, 9, 2))
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.pagination.total, 5);
}
